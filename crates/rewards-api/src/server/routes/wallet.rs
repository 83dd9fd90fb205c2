async fn get_config(State(state): State<AppState>) -> Json<RewardConfig> {
    let inner = state.inner.lock().await;
    Json(inner.api.config().clone())
}

async fn get_wallet(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WalletSummary>, HttpApiError> {
    require_address(&address)?;

    let inner = state.inner.lock().await;
    let summary = inner
        .api
        .wallet_summary(&address)
        .map_err(HttpApiError::from_engine)?;

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
struct CreditRequest {
    amount: u64,
    reason: Option<CreditReason>,
}

async fn credit_wallet(
    Path(address): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CreditRequest>,
) -> Result<Json<WalletSummary>, HttpApiError> {
    require_address(&address)?;
    if request.amount == 0 {
        return Err(HttpApiError::invalid_amount(0));
    }

    let (summary, messages) = {
        let mut inner = state.inner.lock().await;
        let summary = inner
            .api
            .credit(
                &address,
                request.amount,
                request.reason.unwrap_or(CreditReason::Manual),
            )
            .map_err(HttpApiError::from_engine)?;
        let messages = collect_delta_messages(&mut inner);
        (summary, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
    schema_version: String,
    total: usize,
    next_cursor: Option<usize>,
    entries: Vec<LeaderboardEntry>,
}

async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<LeaderboardResponse>, HttpApiError> {
    let entries = {
        let inner = state.inner.lock().await;
        inner.api.leaderboard().map_err(HttpApiError::from_engine)?
    };

    let (start, end, next_cursor) = paginate(entries.len(), query.cursor, query.page_size)?;

    Ok(Json(LeaderboardResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        total: entries.len(),
        next_cursor,
        entries: entries[start..end].to_vec(),
    }))
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    schema_version: String,
    total: usize,
    next_cursor: Option<usize>,
    events: Vec<RewardEvent>,
}

async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<EventsResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let events = inner.api.events();

    let (start, end, next_cursor) = paginate(events.len(), query.cursor, query.page_size)?;

    Ok(Json(EventsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        total: events.len(),
        next_cursor,
        events: events[start..end].to_vec(),
    }))
}
