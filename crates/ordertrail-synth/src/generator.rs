use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone};
use chrono_tz::{Asia::Seoul, Tz};
use ordertrail_core::stages;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SynthError};

const YEAR: i32 = 2025;
const MONTH: u32 = 12;

const REGIONS: [&str; 5] = [
    "Seoul-Gangnam",
    "Seoul-Mapo",
    "Seoul-Songpa",
    "Seoul-Yeongdeungpo",
    "Seoul-Seodaemun",
];
const STORE_COUNT: u32 = 50;
const RIDER_COUNT: u32 = 80;

/// Stages that may be dropped from an order by the missing-event anomaly.
const DROPPABLE: [&str; 4] = [
    stages::COOKING_STARTED,
    stages::RIDER_ASSIGNED,
    stages::PICKED_UP,
    stages::DELIVERED,
];

/// Stages that carry the rider once one is assigned.
const RIDER_STAGES: [&str; 3] = [stages::RIDER_ASSIGNED, stages::PICKED_UP, stages::DELIVERED];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub seed: u64,
    pub missing_rate: f64,
    pub duplicate_rate: f64,
    pub shuffle_rate: f64,
    pub platform: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 200,
            seed: 1,
            missing_rate: 0.03,
            duplicate_rate: 0.02,
            shuffle_rate: 0.05,
            platform: "baemin".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("missing_rate", self.missing_rate),
            ("duplicate_rate", self.duplicate_rate),
            ("shuffle_rate", self.shuffle_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SynthError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

/// The one stretched segment of an order, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelayScenario {
    None,
    Cook,
    Assign,
    Pickup,
    Delivery,
}

impl DelayScenario {
    const ALL: [DelayScenario; 5] = [
        DelayScenario::None,
        DelayScenario::Cook,
        DelayScenario::Assign,
        DelayScenario::Pickup,
        DelayScenario::Delivery,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub delay_scenario: DelayScenario,
}

/// One synthetic record, shaped like the raw events the loaders accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEvent {
    pub event_id: String,
    pub order_id: String,
    pub event_type: String,
    pub event_time: String,
    pub store_id: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<String>,
    pub platform: String,
    pub meta: EventMeta,
}

/// Builds `config.count` orders from a ChaCha8 stream seeded with `config.seed`. The same
/// config always yields the same events in the same order.
pub fn generate(config: &GeneratorConfig) -> Result<Vec<GeneratedEvent>> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut events = Vec::with_capacity(config.count * stages::LIFECYCLE.len());
    for index in 1..=config.count {
        events.extend(order_events(&mut rng, index, config)?);
    }

    info!(
        orders = config.count,
        events = events.len(),
        seed = config.seed,
        "generated synthetic event log"
    );
    Ok(events)
}

fn order_events(
    rng: &mut ChaCha8Rng,
    index: usize,
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedEvent>> {
    let day = rng.gen_range(1..=28);
    let created = seoul_time(
        day,
        rng.gen_range(10..=22),
        rng.gen_range(0..=59),
        rng.gen_range(0..=59),
    )?;
    let order_id = format!("ord_{YEAR}{MONTH:02}{day:02}_{index:04}");

    let store_id = format!("store_{:02}", rng.gen_range(1..=STORE_COUNT));
    let region = pick(rng, &REGIONS).to_string();
    let rider_id = format!("rider_{:02}", rng.gen_range(1..=RIDER_COUNT));

    let (minutes, scenario) = segment_minutes(rng);
    let mut at = created;
    let mut times = vec![created];
    for step in minutes {
        at += Duration::minutes(step);
        times.push(at);
    }

    let mut events: Vec<GeneratedEvent> = stages::LIFECYCLE
        .iter()
        .zip(&times)
        .enumerate()
        .map(|(idx, (stage, time))| GeneratedEvent {
            event_id: format!(
                "evt_{index:04}_{:02}_{}",
                idx + 1,
                rng.gen_range(1000..=9999)
            ),
            order_id: order_id.clone(),
            event_type: stage.to_string(),
            event_time: time.fixed_offset().to_rfc3339_opts(SecondsFormat::Secs, true),
            store_id: store_id.clone(),
            region: region.clone(),
            rider_id: RIDER_STAGES.contains(stage).then(|| rider_id.clone()),
            platform: config.platform.clone(),
            meta: EventMeta {
                delay_scenario: scenario,
            },
        })
        .collect();

    if chance(rng, config.missing_rate) {
        let dropped = *pick(rng, &DROPPABLE);
        events.retain(|event| event.event_type != dropped);
    }

    if chance(rng, config.duplicate_rate) {
        let target = *pick(rng, &stages::LIFECYCLE);
        let suffix = rng.gen_range(100..=999);
        if let Some(original) = events.iter().find(|event| event.event_type == target) {
            let mut copy = original.clone();
            copy.event_id = format!("{}_DUP_{suffix}", original.event_id);
            events.push(copy);
        }
    }

    if chance(rng, config.shuffle_rate) {
        events.shuffle(rng);
    }

    Ok(events)
}

/// Minutes for the six lifecycle segments, with at most one of them stretched.
fn segment_minutes(rng: &mut ChaCha8Rng) -> ([i64; 6], DelayScenario) {
    let mut minutes = [
        rng.gen_range(1..=6),
        rng.gen_range(0..=5),
        rng.gen_range(8..=25),
        rng.gen_range(1..=10),
        rng.gen_range(2..=12),
        rng.gen_range(6..=25),
    ];

    let scenario = *pick(rng, &DelayScenario::ALL);
    match scenario {
        DelayScenario::None => {}
        DelayScenario::Cook => minutes[2] = rng.gen_range(25..=60),
        DelayScenario::Assign => minutes[3] = rng.gen_range(10..=35),
        DelayScenario::Pickup => minutes[4] = rng.gen_range(12..=35),
        DelayScenario::Delivery => minutes[5] = rng.gen_range(25..=60),
    }

    (minutes, scenario)
}

fn seoul_time(day: u32, hour: u32, minute: u32, second: u32) -> Result<DateTime<Tz>> {
    NaiveDate::from_ymd_opt(YEAR, MONTH, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .and_then(|naive| Seoul.from_local_datetime(&naive).single())
        .ok_or(SynthError::InvalidTime {
            day,
            hour,
            minute,
            second,
        })
}

fn chance(rng: &mut ChaCha8Rng, rate: f64) -> bool {
    rng.gen::<f64>() < rate
}

fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> &'a T {
    let idx = rng.gen_range(0..items.len());
    &items[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(count: usize, seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            count,
            seed,
            missing_rate: 0.0,
            duplicate_rate: 0.0,
            shuffle_rate: 0.0,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn same_seed_same_events() {
        let config = GeneratorConfig::default();
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());

        let other = GeneratorConfig {
            seed: 2,
            ..GeneratorConfig::default()
        };
        assert_ne!(generate(&config).unwrap(), generate(&other).unwrap());
    }

    #[test]
    fn clean_orders_have_full_ordered_lifecycle() {
        let events = generate(&quiet(25, 7)).unwrap();
        assert_eq!(events.len(), 25 * 7);

        for order in events.chunks(7) {
            let types: Vec<&str> = order.iter().map(|e| e.event_type.as_str()).collect();
            assert_eq!(types, stages::LIFECYCLE.to_vec());

            let times: Vec<DateTime<chrono::FixedOffset>> = order
                .iter()
                .map(|e| DateTime::parse_from_rfc3339(&e.event_time).unwrap())
                .collect();
            assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
            assert!(order[0].event_time.ends_with("+09:00"));
            assert!(order[0].event_time.starts_with("2025-12-"));
            assert!(order.iter().all(|e| e.order_id == order[0].order_id));
        }
    }

    #[test]
    fn rider_only_after_assignment() {
        for event in generate(&quiet(10, 3)).unwrap() {
            let expects_rider = RIDER_STAGES.contains(&event.event_type.as_str());
            assert_eq!(event.rider_id.is_some(), expects_rider, "{}", event.event_type);
        }
    }

    #[test]
    fn ids_follow_naming_scheme() {
        let events = generate(&quiet(3, 11)).unwrap();
        let first = &events[0];
        assert!(first.order_id.starts_with("ord_202512"));
        assert!(first.order_id.ends_with("_0001"));
        assert!(first.event_id.starts_with("evt_0001_01_"));
        assert_eq!(first.event_id.len(), "evt_0001_01_1234".len());
        assert_eq!(first.platform, "baemin");
    }

    #[test]
    fn forced_missing_drops_one_stage_per_order() {
        let config = GeneratorConfig {
            missing_rate: 1.0,
            ..quiet(20, 5)
        };
        let events = generate(&config).unwrap();
        assert_eq!(events.len(), 20 * 6);
        let created = events
            .iter()
            .filter(|e| e.event_type == stages::ORDER_CREATED)
            .count();
        assert_eq!(created, 20);
    }

    #[test]
    fn forced_duplicate_adds_dup_suffixed_copy() {
        let config = GeneratorConfig {
            duplicate_rate: 1.0,
            ..quiet(12, 9)
        };
        let events = generate(&config).unwrap();
        assert_eq!(events.len(), 12 * 8);

        let dups: Vec<&GeneratedEvent> =
            events.iter().filter(|e| e.event_id.contains("_DUP_")).collect();
        assert_eq!(dups.len(), 12);
    }

    #[test]
    fn rates_outside_unit_interval_are_rejected() {
        let config = GeneratorConfig {
            shuffle_rate: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generate(&config),
            Err(SynthError::InvalidRate { name: "shuffle_rate", .. })
        ));
    }
}
