async fn get_provider_status(State(state): State<AppState>) -> Json<ProviderStatus> {
    Json(state.provider.status())
}

async fn exchange_provider_token(
    State(state): State<AppState>,
    Json(request): Json<TokenExchangeRequest>,
) -> Result<Json<TokenExchangeResponse>, HttpApiError> {
    if request.code.trim().is_empty() {
        return Err(HttpApiError::invalid_request(
            "authorization code must not be empty",
            None,
        ));
    }

    let response = state
        .provider
        .exchange_code(&request)
        .await
        .map_err(HttpApiError::from_provider)?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct AggregateQuery {
    metric: Option<String>,
    access_token: Option<String>,
    start_millis: Option<i64>,
    end_millis: Option<i64>,
}

async fn get_provider_aggregate(
    State(state): State<AppState>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateTotal>, HttpApiError> {
    let metric = parse_metric(query.metric.as_deref().unwrap_or("steps"))?;

    let end_millis = query
        .end_millis
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let start_millis = query.start_millis.unwrap_or(end_millis - 86_400_000);
    if start_millis >= end_millis {
        return Err(HttpApiError::invalid_request(
            "start_millis must be before end_millis",
            Some(format!("start={start_millis} end={end_millis}")),
        ));
    }

    let access_token = match query.access_token {
        Some(token) if !token.trim().is_empty() => token,
        // Demo mode never touches the token; configured deployments need one.
        _ if !state.provider.status().configured => String::new(),
        _ => {
            return Err(HttpApiError::invalid_request(
                "access_token is required",
                None,
            ))
        }
    };

    let total = state
        .provider
        .aggregate(&access_token, metric, start_millis, end_millis)
        .await
        .map_err(HttpApiError::from_provider)?;

    Ok(Json(total))
}
