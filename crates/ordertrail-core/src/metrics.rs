use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::TimelineRules;
use crate::model::{stages, Dimensions};
use crate::timeline::OrderTimeline;

/// Interval between two adjacent lifecycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    Accept,
    PrepWait,
    Cook,
    Assign,
    Pickup,
    Delivery,
}

impl Segment {
    pub const ALL: [Segment; 6] = [
        Segment::Accept,
        Segment::PrepWait,
        Segment::Cook,
        Segment::Assign,
        Segment::Pickup,
        Segment::Delivery,
    ];

    /// `(from, to)` stage names.
    pub fn bounds(&self) -> (&'static str, &'static str) {
        match self {
            Segment::Accept => (stages::ORDER_CREATED, stages::STORE_ACCEPTED),
            Segment::PrepWait => (stages::STORE_ACCEPTED, stages::COOKING_STARTED),
            Segment::Cook => (stages::COOKING_STARTED, stages::COOKING_FINISHED),
            Segment::Assign => (stages::COOKING_FINISHED, stages::RIDER_ASSIGNED),
            Segment::Pickup => (stages::RIDER_ASSIGNED, stages::PICKED_UP),
            Segment::Delivery => (stages::PICKED_UP, stages::DELIVERED),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Accept => "ACCEPT",
            Segment::PrepWait => "PREP_WAIT",
            Segment::Cook => "COOK",
            Segment::Assign => "ASSIGN",
            Segment::Pickup => "PICKUP",
            Segment::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentDuration {
    pub segment: Segment,
    pub seconds: i64,
}

/// Per-order scalars consumed by the KPI aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetrics {
    pub order_id: String,
    pub is_completed: bool,
    /// Seconds between the representatives of the first and last completion stages. Present only
    /// for completed orders.
    pub total_lead_time: Option<i64>,
    /// Only segments whose two bounding stages both have a representative, in lifecycle order.
    pub segments: Vec<SegmentDuration>,
    pub has_missing: bool,
    pub has_duplicate_types: bool,
    pub has_out_of_order: bool,
    pub dimensions: Dimensions,
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl OrderMetrics {
    pub fn segment(&self, segment: Segment) -> Option<i64> {
        self.segments
            .iter()
            .find(|entry| entry.segment == segment)
            .map(|entry| entry.seconds)
    }

    /// Longest non-negative segment; the earlier segment wins a tie.
    pub fn dominant_bottleneck(&self) -> Option<Segment> {
        let mut best: Option<SegmentDuration> = None;
        for entry in &self.segments {
            if entry.seconds < 0 {
                continue;
            }
            match best {
                Some(current) if entry.seconds <= current.seconds => {}
                _ => best = Some(*entry),
            }
        }
        best.map(|entry| entry.segment)
    }
}

/// Lead time spans the first to the last stage of `rules.required_for_completed`, which is
/// `ORDER_CREATED` to `DELIVERED` by default. It is present exactly when the timeline is
/// completed.
///
/// Segments only cover adjacent pairs of the standard lifecycle. When a stage in the middle has
/// no representative, both segments touching it are absent and the gap is not folded into a
/// neighbouring segment.
pub fn extract_metrics(timeline: &OrderTimeline, rules: &TimelineRules) -> OrderMetrics {
    let seconds_between = |from: &str, to: &str| -> Option<i64> {
        let start = timeline.representative(from)?;
        let end = timeline.representative(to)?;
        Some((end.event_time - start.event_time).num_seconds())
    };

    let total_lead_time = match (
        rules.required_for_completed.first(),
        rules.required_for_completed.last(),
    ) {
        (Some(first), Some(last)) if timeline.is_completed() => seconds_between(first, last),
        _ => None,
    };

    let segments = Segment::ALL
        .iter()
        .filter_map(|segment| {
            let (from, to) = segment.bounds();
            seconds_between(from, to).map(|seconds| SegmentDuration {
                segment: *segment,
                seconds,
            })
        })
        .collect();

    let anomalies = &timeline.anomalies;

    OrderMetrics {
        order_id: timeline.order_id.clone(),
        is_completed: timeline.is_completed(),
        total_lead_time,
        segments,
        has_missing: !anomalies.missing.is_empty(),
        has_duplicate_types: !anomalies.duplicate_types.is_empty(),
        has_out_of_order: anomalies.out_of_order,
        dimensions: timeline.dimensions.clone(),
        created_at: timeline
            .representative(stages::ORDER_CREATED)
            .map(|event| event.event_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with(segments: &[(Segment, i64)]) -> OrderMetrics {
        OrderMetrics {
            order_id: "A".to_string(),
            is_completed: true,
            total_lead_time: Some(segments.iter().map(|(_, s)| s).sum()),
            segments: segments
                .iter()
                .map(|(segment, seconds)| SegmentDuration {
                    segment: *segment,
                    seconds: *seconds,
                })
                .collect(),
            has_missing: false,
            has_duplicate_types: false,
            has_out_of_order: false,
            dimensions: Dimensions::default(),
            created_at: None,
        }
    }

    #[test]
    fn bottleneck_prefers_earlier_segment_on_tie() {
        let metrics = metrics_with(&[(Segment::Cook, 600), (Segment::Delivery, 600)]);
        assert_eq!(metrics.dominant_bottleneck(), Some(Segment::Cook));
    }

    #[test]
    fn bottleneck_ignores_negative_segments() {
        let metrics = metrics_with(&[(Segment::Accept, -120), (Segment::Pickup, 0)]);
        assert_eq!(metrics.dominant_bottleneck(), Some(Segment::Pickup));

        let all_negative = metrics_with(&[(Segment::Accept, -5)]);
        assert_eq!(all_negative.dominant_bottleneck(), None);
    }
}
