#[derive(Debug, Deserialize)]
struct StepsRequest {
    total_steps: u64,
}

async fn report_steps(
    Path(address): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<StepsRequest>,
) -> Result<Json<StepEvaluation>, HttpApiError> {
    require_address(&address)?;

    let (evaluation, messages) = {
        let mut inner = state.inner.lock().await;
        let evaluation = inner
            .api
            .record_steps(&address, request.total_steps)
            .map_err(HttpApiError::from_engine)?;
        let messages = collect_delta_messages(&mut inner);
        (evaluation, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(evaluation))
}

#[derive(Debug, Deserialize)]
struct GoalsQuery {
    period: Option<String>,
}

async fn get_goals(
    Path(address): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<GoalsQuery>,
) -> Result<Json<GoalSetSnapshot>, HttpApiError> {
    require_address(&address)?;
    let period = parse_period(query.period.as_deref())?;

    // Reading rolls a stale period over, which can emit a reset event.
    let (set, messages) = {
        let mut inner = state.inner.lock().await;
        let set = inner
            .api
            .goal_set(&address, period)
            .map_err(HttpApiError::from_engine)?;
        let messages = collect_delta_messages(&mut inner);
        (set, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(set))
}

#[derive(Debug, Deserialize)]
struct GoalProgressRequest {
    period: Option<String>,
    kind: GoalKind,
    achieved: u64,
}

async fn report_goal_progress(
    Path(address): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<GoalProgressRequest>,
) -> Result<Json<GoalProgressOutcome>, HttpApiError> {
    require_address(&address)?;
    let period = parse_period(request.period.as_deref())?;

    let (outcome, messages) = {
        let mut inner = state.inner.lock().await;
        let outcome = inner
            .api
            .record_goal_progress(&address, period, request.kind, request.achieved)
            .map_err(HttpApiError::from_engine)?;
        let messages = collect_delta_messages(&mut inner);
        (outcome, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(outcome))
}
