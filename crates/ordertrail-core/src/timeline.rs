use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::TimelineRules;
use crate::model::{stages, Dimensions, NormalizedEvent};

/// The reconstructed lifecycle of a single order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTimeline {
    pub order_id: String,
    /// Deduplicated by `event_id`, stable-sorted by `event_time`.
    pub events: Vec<NormalizedEvent>,
    /// One representative per lifecycle stage that occurred at least once.
    pub event_index: BTreeMap<String, NormalizedEvent>,
    pub anomalies: Anomalies,
    pub status: TimelineStatus,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomalies {
    /// The arrival sequence was not chronological.
    pub out_of_order: bool,
    /// One entry per discarded repeat of an already-seen `event_id`.
    pub duplicated_event_ids: Vec<String>,
    /// Event types with more than one surviving event.
    pub duplicate_types: Vec<String>,
    /// Lifecycle stages with no representative.
    pub missing: Vec<String>,
    /// Completion stages with no representative.
    pub missing_for_completed: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStatus {
    pub is_completed: bool,
}

impl Anomalies {
    /// Whether anything about the timeline's data deserves attention.
    pub fn any(&self) -> bool {
        self.out_of_order
            || !self.duplicated_event_ids.is_empty()
            || !self.duplicate_types.is_empty()
            || !self.missing.is_empty()
    }
}

impl OrderTimeline {
    pub fn representative(&self, stage: &str) -> Option<&NormalizedEvent> {
        self.event_index.get(stage)
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed
    }
}

/// Builds one timeline per distinct `order_id`, in first-seen order.
///
/// Order groups are independent, so each is built on the rayon pool; the ordered collect keeps
/// the output deterministic.
pub fn build_timelines(events: &[NormalizedEvent], rules: &TimelineRules) -> Vec<OrderTimeline> {
    let groups = group_by_order(events);
    let group_count = groups.len();

    let timelines: Vec<OrderTimeline> = groups
        .into_par_iter()
        .filter_map(|(order_id, arrivals)| build_order_timeline(order_id, &arrivals, rules))
        .collect();

    debug!(
        events = events.len(),
        orders = group_count,
        completed = timelines.iter().filter(|t| t.is_completed()).count(),
        "built order timelines"
    );

    timelines
}

fn group_by_order(events: &[NormalizedEvent]) -> Vec<(&str, Vec<&NormalizedEvent>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&NormalizedEvent>)> = Vec::new();

    for event in events {
        let order_id = event.order_id.as_str();
        let idx = *positions.entry(order_id).or_insert_with(|| {
            groups.push((order_id, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(event);
    }

    groups
}

fn build_order_timeline(
    order_id: &str,
    arrivals: &[&NormalizedEvent],
    rules: &TimelineRules,
) -> Option<OrderTimeline> {
    // Judged on arrival order, before anything is discarded or sorted.
    let out_of_order = arrivals
        .windows(2)
        .any(|pair| pair[1].event_time < pair[0].event_time);

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut duplicated_event_ids = Vec::new();
    let mut kept: Vec<&NormalizedEvent> = Vec::with_capacity(arrivals.len());
    for &event in arrivals {
        if seen_ids.insert(event.event_id.as_str()) {
            kept.push(event);
        } else {
            duplicated_event_ids.push(event.event_id.clone());
        }
    }

    if kept.is_empty() {
        return None;
    }

    // Stable: equal timestamps keep arrival order.
    kept.sort_by_key(|event| event.event_time);

    let by_type = group_by_type(&kept);
    let duplicate_types: Vec<String> = by_type
        .iter()
        .filter(|(_, events)| events.len() > 1)
        .map(|(event_type, _)| event_type.to_string())
        .collect();

    let mut event_index = BTreeMap::new();
    let indexed_stages = rules
        .lifecycle
        .iter()
        .chain(rules.required_for_completed.iter());
    for stage in indexed_stages {
        if event_index.contains_key(stage) {
            continue;
        }
        let candidates = by_type
            .iter()
            .find(|(event_type, _)| *event_type == stage.as_str())
            .map(|(_, events)| events.as_slice())
            .unwrap_or_default();
        if let Some(selected) = select_representative(candidates, rules.prefers_earliest(stage)) {
            event_index.insert(stage.clone(), selected.clone());
        }
    }

    let missing = absent_stages(&rules.lifecycle, &event_index);
    let missing_for_completed = absent_stages(&rules.required_for_completed, &event_index);
    let is_completed = missing_for_completed.is_empty();

    let dimensions = event_index
        .get(stages::ORDER_CREATED)
        .or_else(|| kept.first().copied())
        .map(Dimensions::from_event)
        .unwrap_or_default();

    Some(OrderTimeline {
        order_id: order_id.to_string(),
        events: kept.into_iter().cloned().collect(),
        event_index,
        anomalies: Anomalies {
            out_of_order,
            duplicated_event_ids,
            duplicate_types,
            missing,
            missing_for_completed,
        },
        status: TimelineStatus { is_completed },
        dimensions,
    })
}

/// Partitions time-sorted events by type, keeping the first-seen order of types.
fn group_by_type<'a>(sorted: &[&'a NormalizedEvent]) -> Vec<(&'a str, Vec<&'a NormalizedEvent>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<&'a NormalizedEvent>)> = Vec::new();

    for &event in sorted {
        let event_type = event.event_type.as_str();
        let idx = *positions.entry(event_type).or_insert_with(|| {
            groups.push((event_type, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(event);
    }

    groups
}

/// Picks the earliest or the latest event. On equal timestamps the first candidate in the
/// (time-sorted) slice is kept, since only a strictly better timestamp replaces the current pick.
fn select_representative<'a>(
    candidates: &[&'a NormalizedEvent],
    earliest: bool,
) -> Option<&'a NormalizedEvent> {
    candidates.iter().copied().reduce(|best, current| {
        let better = if earliest {
            current.event_time < best.event_time
        } else {
            current.event_time > best.event_time
        };
        if better {
            current
        } else {
            best
        }
    })
}

fn absent_stages(wanted: &[String], index: &BTreeMap<String, NormalizedEvent>) -> Vec<String> {
    wanted
        .iter()
        .filter(|stage| !index.contains_key(stage.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use serde_json::Map;

    fn event(id: &str, event_type: &str, time: &str) -> NormalizedEvent {
        NormalizedEvent {
            event_id: id.to_string(),
            order_id: "A".to_string(),
            event_type: event_type.to_string(),
            event_time: DateTime::<FixedOffset>::parse_from_rfc3339(time).expect("time"),
            store_id: None,
            region: None,
            rider_id: None,
            platform: None,
            meta: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn latest_tie_keeps_first_in_sorted_order() {
        let first = event("d1", "DELIVERED", "2025-12-01T10:30:00Z");
        let second = event("d2", "DELIVERED", "2025-12-01T10:30:00Z");
        let picked = select_representative(&[&first, &second], false).expect("pick");
        assert_eq!(picked.event_id, "d1");
    }

    #[test]
    fn earliest_tie_keeps_first_in_sorted_order() {
        let first = event("c1", "ORDER_CREATED", "2025-12-01T10:00:00Z");
        let second = event("c2", "ORDER_CREATED", "2025-12-01T10:00:00Z");
        let picked = select_representative(&[&first, &second], true).expect("pick");
        assert_eq!(picked.event_id, "c1");
    }

    #[test]
    fn empty_candidates_select_nothing() {
        assert!(select_representative(&[], true).is_none());
    }
}
