#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<ServerInner>>,
    provider: ProviderClient,
    stream_tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    fn new(api: RewardsApi, provider: ProviderClient) -> Self {
        let (stream_tx, _) = broadcast::channel(4096);
        Self {
            inner: std::sync::Arc::new(Mutex::new(ServerInner {
                api,
                emitted_event_count: 0,
            })),
            provider,
            stream_tx,
        }
    }
}

struct ServerInner {
    api: RewardsApi,
    emitted_event_count: usize,
}

fn collect_delta_messages(inner: &mut ServerInner) -> Vec<StreamMessage> {
    let mut messages = Vec::new();

    let new_events = &inner.api.events()[inner.emitted_event_count..];
    for event in new_events {
        messages.push(StreamMessage::event_appended(event));
    }
    inner.emitted_event_count = inner.api.events().len();

    messages
}

fn broadcast_messages(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        let _ = state.stream_tx.send(message);
    }
}
