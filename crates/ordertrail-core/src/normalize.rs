use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{NormalizedEvent, RawEvent};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingEventId,
    MissingOrderId,
    MissingEventType,
    MissingEventTime,
    UnparseableEventTime,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingEventId => "missing_event_id",
            DropReason::MissingOrderId => "missing_order_id",
            DropReason::MissingEventType => "missing_event_type",
            DropReason::MissingEventTime => "missing_event_time",
            DropReason::UnparseableEventTime => "unparseable_event_time",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationSummary {
    pub total: usize,
    pub accepted: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl NormalizationSummary {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Validates one raw record. Records missing a required field, or whose `event_time` cannot be
/// read as an absolute instant, yield `None`.
pub fn normalize(raw: &RawEvent) -> Option<NormalizedEvent> {
    classify(raw).ok()
}

/// Normalizes a whole batch, keeping input order and counting why records were dropped.
pub fn normalize_batch(raws: &[RawEvent]) -> (Vec<NormalizedEvent>, NormalizationSummary) {
    let mut events = Vec::with_capacity(raws.len());
    let mut summary = NormalizationSummary {
        total: raws.len(),
        ..Default::default()
    };

    for raw in raws {
        match classify(raw) {
            Ok(event) => events.push(event),
            Err(reason) => *summary.dropped.entry(reason).or_insert(0) += 1,
        }
    }
    summary.accepted = events.len();

    (events, summary)
}

fn classify(raw: &RawEvent) -> Result<NormalizedEvent, DropReason> {
    let event_id = required_str(raw.event_id.as_ref()).ok_or(DropReason::MissingEventId)?;
    let order_id = required_str(raw.order_id.as_ref()).ok_or(DropReason::MissingOrderId)?;
    let event_type = required_str(raw.event_type.as_ref()).ok_or(DropReason::MissingEventType)?;
    let time_value = raw
        .event_time
        .as_ref()
        .filter(|value| !is_blank(value))
        .ok_or(DropReason::MissingEventTime)?;
    let event_time = parse_event_time(time_value).ok_or(DropReason::UnparseableEventTime)?;

    Ok(NormalizedEvent {
        event_id: event_id.to_string(),
        order_id: order_id.to_string(),
        event_type: event_type.to_uppercase(),
        event_time,
        store_id: raw.store_id.clone(),
        region: raw.region.clone(),
        rider_id: raw.rider_id.clone(),
        platform: raw.platform.clone(),
        meta: raw.meta.clone(),
        extra: raw.extra.clone(),
    })
}

fn required_str(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn parse_event_time(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_time_str(s),
        // Epoch milliseconds.
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        _ => None,
    }
}

fn from_epoch_millis(millis: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.fixed_offset())
}

/// Timestamps without an offset are read as UTC. An all-digit string is epoch milliseconds, which
/// is how CSV cells carry numeric times.
pub(crate) fn parse_time_str(input: &str) -> Option<DateTime<FixedOffset>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(from_epoch_millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}
