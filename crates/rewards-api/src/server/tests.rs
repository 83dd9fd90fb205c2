use super::*;

#[test]
fn pagination_enforces_max_bounds() {
    let (start, end, next_cursor) = paginate(100, Some(10), Some(20)).expect("page should work");
    assert_eq!(start, 10);
    assert_eq!(end, 30);
    assert_eq!(next_cursor, Some(30));

    let out_of_range = paginate(5, Some(10), Some(1));
    assert!(out_of_range.is_err());
}

#[test]
fn period_parsing_defaults_to_daily() {
    assert_eq!(parse_period(None).expect("default"), GoalPeriod::Daily);
    assert_eq!(
        parse_period(Some("weekly")).expect("weekly"),
        GoalPeriod::Weekly
    );
    assert!(parse_period(Some("monthly")).is_err());
}

#[test]
fn metric_parsing_accepts_both_distance_spellings() {
    assert_eq!(
        parse_metric("distance").expect("short"),
        MetricKind::DistanceMeters
    );
    assert_eq!(
        parse_metric("distance_meters").expect("long"),
        MetricKind::DistanceMeters
    );
    assert!(parse_metric("elevation").is_err());
}

#[test]
fn stream_messages_carry_the_event_sequence() {
    let event = RewardEvent {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event_id: "evt:7".to_string(),
        sequence: 7,
        event_type: contracts::RewardEventType::TokensCredited,
        address: "0xA".to_string(),
        amount: Some(10),
        reason: Some(CreditReason::Manual),
        created_at: "2026-01-05T08:00:00+00:00".to_string(),
        details: None,
    };

    let message = StreamMessage::event_appended(&event);
    assert_eq!(message.message_type, "event.appended");
    assert_eq!(message.sequence, 7);
    assert_eq!(message.reconnect_token, "event:7");
}
