#[derive(Debug, Deserialize)]
struct TipRequest {
    from_address: String,
    to_address: String,
    amount: u64,
    kind: Option<TipKind>,
    note: Option<String>,
}

async fn send_tip(
    State(state): State<AppState>,
    Json(request): Json<TipRequest>,
) -> Result<Json<TipTransaction>, HttpApiError> {
    require_address(&request.from_address)?;
    require_address(&request.to_address)?;
    if request.amount == 0 {
        return Err(HttpApiError::invalid_amount(0));
    }

    // Simulated network latency runs before the critical section, so a slow
    // confirmation can never hold the ledger open for a second spend.
    let latency_ms = {
        let inner = state.inner.lock().await;
        inner.api.config().tip_latency_ms
    };
    if latency_ms > 0 {
        time::sleep(Duration::from_millis(latency_ms)).await;
    }

    let (transaction, messages) = {
        let mut inner = state.inner.lock().await;
        let transaction = inner
            .api
            .send_tip(
                &request.from_address,
                &request.to_address,
                request.amount,
                request.kind.unwrap_or(TipKind::Tip),
                request.note,
            )
            .map_err(HttpApiError::from_engine)?;
        let messages = collect_delta_messages(&mut inner);
        (transaction, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(transaction))
}

#[derive(Debug, Deserialize)]
struct TipsQuery {
    address: Option<String>,
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TipsResponse {
    schema_version: String,
    total: usize,
    next_cursor: Option<usize>,
    transactions: Vec<TipTransaction>,
}

async fn get_tips(
    State(state): State<AppState>,
    Query(query): Query<TipsQuery>,
) -> Result<Json<TipsResponse>, HttpApiError> {
    let transactions = {
        let inner = state.inner.lock().await;
        match query.address.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(address) => inner
                .api
                .transaction_history(address)
                .map_err(HttpApiError::from_engine)?,
            None => inner
                .api
                .transactions()
                .map_err(HttpApiError::from_engine)?,
        }
    };

    let (start, end, next_cursor) = paginate(transactions.len(), query.cursor, query.page_size)?;

    Ok(Json(TipsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        total: transactions.len(),
        next_cursor,
        transactions: transactions[start..end].to_vec(),
    }))
}

#[derive(Debug, Serialize)]
struct EarningsResponse {
    schema_version: String,
    address: String,
    #[serde(with = "contracts::serde_u64_string")]
    total_earned: u64,
}

async fn get_trainer_earnings(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EarningsResponse>, HttpApiError> {
    require_address(&address)?;

    let total_earned = {
        let inner = state.inner.lock().await;
        inner
            .api
            .trainer_earnings(&address)
            .map_err(HttpApiError::from_engine)?
    };

    Ok(Json(EarningsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        address,
        total_earned,
    }))
}
