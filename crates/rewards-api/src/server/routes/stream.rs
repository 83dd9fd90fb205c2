async fn stream_events(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let initial_message = {
        let inner = state.inner.lock().await;
        StreamMessage::hello(inner.api.events().len())
    };

    ws.on_upgrade(move |socket| stream_socket(socket, state, initial_message))
}

async fn stream_socket(mut socket: WebSocket, state: AppState, initial_message: StreamMessage) {
    if send_stream_message(&mut socket, &initial_message)
        .await
        .is_err()
    {
        return;
    }

    let mut rx = state.stream_tx.subscribe();

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(message) => {
                        if send_stream_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        let warning = StreamMessage::warning(format!(
                            "stream client lagged and skipped {skipped} message(s)"
                        ));

                        if send_stream_message(&mut socket, &warning).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }
}

async fn send_stream_message(
    socket: &mut WebSocket,
    message: &StreamMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

#[derive(Debug, Clone, Serialize)]
struct StreamMessage {
    schema_version: String,
    #[serde(rename = "type")]
    message_type: String,
    sequence: u64,
    reconnect_token: String,
    payload: Value,
}

impl StreamMessage {
    /// First frame on every connection; tells the client how many events it
    /// missed so it can backfill via `GET /events`.
    fn hello(event_count: usize) -> Self {
        let sequence = event_count as u64;
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "stream.hello".to_string(),
            sequence,
            reconnect_token: reconnect_token("hello", sequence),
            payload: json!({ "event_count": event_count }),
        }
    }

    fn event_appended(event: &RewardEvent) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "event.appended".to_string(),
            sequence: event.sequence,
            reconnect_token: reconnect_token("event", event.sequence),
            payload: json!(event),
        }
    }

    fn warning(warning: String) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "warning".to_string(),
            sequence: 0,
            reconnect_token: reconnect_token("warning", 0),
            payload: json!({ "message": warning }),
        }
    }
}
