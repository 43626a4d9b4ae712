use ordertrail_core::{normalize, normalize_batch, DropReason, RawEvent};
use serde_json::{json, Value};

fn raw(value: Value) -> RawEvent {
    serde_json::from_value(value).expect("raw event")
}

fn complete() -> Value {
    json!({
        "event_id": "evt_0001_01_1234",
        "order_id": "ord_20251201_0001",
        "event_type": "order_created",
        "event_time": "2025-12-01T10:00:00+09:00",
        "store_id": "store_01",
        "region": "Seoul-Gangnam",
        "platform": "baemin",
        "meta": {"delay_scenario": "COOK"},
        "channel": "app"
    })
}

#[test]
fn normalize_uppercases_type_and_keeps_passthrough_fields() {
    let event = normalize(&raw(complete())).expect("valid event");

    assert_eq!(event.event_type, "ORDER_CREATED");
    assert_eq!(event.event_id, "evt_0001_01_1234");
    assert_eq!(event.order_id, "ord_20251201_0001");
    assert_eq!(event.event_time.timestamp(), 1_764_550_800);
    assert_eq!(event.event_time.offset().local_minus_utc(), 9 * 3600);
    assert_eq!(event.meta, Some(json!({"delay_scenario": "COOK"})));
    assert_eq!(event.region, Some(json!("Seoul-Gangnam")));
    assert_eq!(event.extra.get("channel"), Some(&json!("app")));
}

#[test]
fn normalize_drops_records_missing_required_fields() {
    for field in ["event_id", "order_id", "event_type", "event_time"] {
        let mut value = complete();
        value.as_object_mut().expect("object").remove(field);
        assert!(normalize(&raw(value)).is_none(), "{field} missing should drop");

        let mut value = complete();
        value[field] = json!("");
        assert!(normalize(&raw(value)).is_none(), "{field} empty should drop");

        let mut value = complete();
        value[field] = Value::Null;
        assert!(normalize(&raw(value)).is_none(), "{field} null should drop");
    }
}

#[test]
fn normalize_drops_wrongly_typed_identifiers() {
    let mut value = complete();
    value["order_id"] = json!({"id": 1});
    assert!(normalize(&raw(value)).is_none());
}

#[test]
fn normalize_drops_unparseable_time() {
    let mut value = complete();
    value["event_time"] = json!("31/12/2025 noon");
    assert!(normalize(&raw(value)).is_none());

    let mut value = complete();
    value["event_time"] = json!(true);
    assert!(normalize(&raw(value)).is_none());
}

#[test]
fn normalize_accepts_epoch_millis() {
    let mut value = complete();
    value["event_time"] = json!(1_764_550_800_000_i64);
    let event = normalize(&raw(value)).expect("epoch millis");
    assert_eq!(event.event_time.timestamp(), 1_764_550_800);
}

#[test]
fn normalize_passes_unknown_types_through() {
    let mut value = complete();
    value["event_type"] = json!("Refund_Requested");
    let event = normalize(&raw(value)).expect("unknown type still valid");
    assert_eq!(event.event_type, "REFUND_REQUESTED");
}

#[test]
fn batch_counts_drop_reasons_and_preserves_order() {
    let mut missing_id = complete();
    missing_id.as_object_mut().expect("object").remove("event_id");
    let mut bad_time = complete();
    bad_time["event_time"] = json!("later");
    let mut second = complete();
    second["event_id"] = json!("evt_0001_02_9999");

    let raws = vec![
        raw(complete()),
        raw(missing_id),
        raw(bad_time),
        raw(second),
    ];
    let (events, summary) = normalize_batch(&raws);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, "evt_0001_01_1234");
    assert_eq!(events[1].event_id, "evt_0001_02_9999");
    assert_eq!(summary.total, 4);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.dropped_total(), 2);
    assert_eq!(summary.dropped.get(&DropReason::MissingEventId), Some(&1));
    assert_eq!(summary.dropped.get(&DropReason::UnparseableEventTime), Some(&1));
}
