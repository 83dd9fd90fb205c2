fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

fn require_address(address: &str) -> Result<(), HttpApiError> {
    if address.trim().is_empty() {
        return Err(HttpApiError::invalid_request(
            "wallet address must not be empty",
            None,
        ));
    }
    Ok(())
}

fn parse_period(value: Option<&str>) -> Result<GoalPeriod, HttpApiError> {
    match value.map(|raw| raw.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("daily") => Ok(GoalPeriod::Daily),
        Some("weekly") => Ok(GoalPeriod::Weekly),
        Some(other) => Err(HttpApiError::invalid_request(
            "period must be daily or weekly",
            Some(format!("period={other}")),
        )),
    }
}

fn parse_metric(value: &str) -> Result<MetricKind, HttpApiError> {
    match value.trim().to_lowercase().as_str() {
        "steps" => Ok(MetricKind::Steps),
        "calories" => Ok(MetricKind::Calories),
        "distance" | "distance_meters" => Ok(MetricKind::DistanceMeters),
        "active_minutes" => Ok(MetricKind::ActiveMinutes),
        "heart_points" => Ok(MetricKind::HeartPoints),
        other => Err(HttpApiError::invalid_request(
            "unknown aggregate metric",
            Some(format!("metric={other}")),
        )),
    }
}

fn paginate(
    total: usize,
    cursor: Option<usize>,
    page_size: Option<usize>,
) -> Result<(usize, usize, Option<usize>), HttpApiError> {
    let start = cursor.unwrap_or(0);
    if start > total {
        return Err(HttpApiError::invalid_request(
            "cursor is out of bounds",
            Some(format!("cursor={start} total={total}")),
        ));
    }

    let size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1)
        .min(MAX_PAGE_SIZE);
    let end = start.saturating_add(size).min(total);
    let next_cursor = if end < total { Some(end) } else { None };

    Ok((start, end, next_cursor))
}

fn reconnect_token(label: &str, sequence: u64) -> String {
    format!("{label}:{sequence}")
}
