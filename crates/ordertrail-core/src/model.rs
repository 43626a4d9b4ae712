use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical lifecycle stage names, in fulfilment order.
pub mod stages {
    pub const ORDER_CREATED: &str = "ORDER_CREATED";
    pub const STORE_ACCEPTED: &str = "STORE_ACCEPTED";
    pub const COOKING_STARTED: &str = "COOKING_STARTED";
    pub const COOKING_FINISHED: &str = "COOKING_FINISHED";
    pub const RIDER_ASSIGNED: &str = "RIDER_ASSIGNED";
    pub const PICKED_UP: &str = "PICKED_UP";
    pub const DELIVERED: &str = "DELIVERED";

    pub const LIFECYCLE: [&str; 7] = [
        ORDER_CREATED,
        STORE_ACCEPTED,
        COOKING_STARTED,
        COOKING_FINISHED,
        RIDER_ASSIGNED,
        PICKED_UP,
        DELIVERED,
    ];

    /// Minimal set of stages an order needs before it counts as completed.
    pub const REQUIRED_FOR_COMPLETED: [&str; 2] = [ORDER_CREATED, DELIVERED];
}

/// One record as it arrives from a loader. Nothing here is trusted: every field may be missing,
/// null or carry the wrong JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated event. Only the normalizer constructs these, so the required fields are always
/// present and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub event_id: String,
    pub order_id: String,
    pub event_type: String,
    /// Absolute instant; comparisons ignore the offset, which is kept for hour bucketing.
    pub event_time: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptive attributes attached to a timeline for grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub region: Option<String>,
    pub store_id: Option<String>,
    pub rider_id: Option<String>,
    pub platform: Option<String>,
}

impl Dimensions {
    pub fn from_event(event: &NormalizedEvent) -> Self {
        Self {
            region: label(event.region.as_ref()),
            store_id: label(event.store_id.as_ref()),
            rider_id: label(event.rider_id.as_ref()),
            platform: label(event.platform.as_ref()),
        }
    }
}

/// Scalar JSON values become grouping labels; null, arrays and objects do not.
fn label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_event_keeps_unknown_fields() {
        let raw: RawEvent = serde_json::from_value(json!({
            "event_id": "e1",
            "order_id": null,
            "channel": "app",
        }))
        .expect("raw event");

        assert_eq!(raw.event_id, Some(json!("e1")));
        assert_eq!(raw.order_id, None);
        assert_eq!(raw.extra.get("channel"), Some(&json!("app")));
    }

    #[test]
    fn labels_only_scalars() {
        assert_eq!(label(Some(&json!("Seoul-Mapo"))), Some("Seoul-Mapo".to_string()));
        assert_eq!(label(Some(&json!(7))), Some("7".to_string()));
        assert_eq!(label(Some(&json!({"a": 1}))), None);
        assert_eq!(label(None), None);
    }
}
