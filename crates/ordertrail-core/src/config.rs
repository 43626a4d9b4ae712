use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::metrics::OrderMetrics;
use crate::model::stages;

pub const DEFAULT_SLA_SECONDS: i64 = 2700;
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_MAX_EVENTS: usize = 1_000_000;

/// Stage sets that drive anomaly classification and representative selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineRules {
    /// Full lifecycle, in fulfilment order. Stages absent from an order are reported as missing.
    pub lifecycle: Vec<String>,
    /// Stages that must all be present for an order to count as completed.
    pub required_for_completed: Vec<String>,
    /// Stages whose earliest occurrence is representative; every other stage keeps the latest.
    pub earliest_wins: Vec<String>,
}

impl Default for TimelineRules {
    fn default() -> Self {
        Self {
            lifecycle: stages::LIFECYCLE.iter().map(|s| s.to_string()).collect(),
            required_for_completed: stages::REQUIRED_FOR_COMPLETED
                .iter()
                .map(|s| s.to_string())
                .collect(),
            earliest_wins: vec![stages::ORDER_CREATED.to_string()],
        }
    }
}

impl TimelineRules {
    pub fn prefers_earliest(&self, event_type: &str) -> bool {
        self.earliest_wins.iter().any(|t| t == event_type)
    }

    /// An empty completion set would mark every order completed without a lead time to measure.
    pub fn validate(&self) -> Result<()> {
        if self.required_for_completed.is_empty() {
            return Err(PipelineError::InvalidRules(
                "required_for_completed must name at least one stage".to_string(),
            ));
        }
        Ok(())
    }
}

/// Built-in grouping attributes for the KPI breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    #[default]
    Region,
    #[serde(alias = "store_id")]
    Store,
    #[serde(alias = "rider_id")]
    Rider,
    Platform,
    /// Hour of day of order creation, in the offset the source stamped on the event.
    #[serde(alias = "hour_bucket")]
    CreatedHour,
}

impl GroupDimension {
    pub fn key_of(&self, metrics: &OrderMetrics) -> Option<String> {
        let dims = &metrics.dimensions;
        match self {
            GroupDimension::Region => dims.region.clone(),
            GroupDimension::Store => dims.store_id.clone(),
            GroupDimension::Rider => dims.rider_id.clone(),
            GroupDimension::Platform => dims.platform.clone(),
            GroupDimension::CreatedHour => metrics
                .created_at
                .map(|created| format!("{:02}", created.hour())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupDimension::Region => "region",
            GroupDimension::Store => "store",
            GroupDimension::Rider => "rider",
            GroupDimension::Platform => "platform",
            GroupDimension::CreatedHour => "created_hour",
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupDimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(GroupDimension::Region),
            "store" | "store_id" => Ok(GroupDimension::Store),
            "rider" | "rider_id" => Ok(GroupDimension::Rider),
            "platform" => Ok(GroupDimension::Platform),
            "created_hour" | "hour_bucket" | "hour" => Ok(GroupDimension::CreatedHour),
            other => Err(format!(
                "unknown group dimension '{other}' (expected region, store, rider, platform or created_hour)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    /// Lead time above which a completed order counts as delayed.
    pub sla_seconds: i64,
    pub group_by: GroupDimension,
    /// Depth of the bottleneck ranking.
    pub top_n: usize,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            sla_seconds: DEFAULT_SLA_SECONDS,
            group_by: GroupDimension::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub timeline: TimelineRules,
    pub kpi: KpiConfig,
    /// Upper bound on raw records accepted in one batch.
    pub max_events: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineRules::default(),
            kpi: KpiConfig::default(),
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.timeline.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|err| PipelineError::io(path, err))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [kpi]
            sla_seconds = 1800
            group_by = "store_id"
            "#,
        )
        .expect("config");

        assert_eq!(config.kpi.sla_seconds, 1800);
        assert_eq!(config.kpi.group_by, GroupDimension::Store);
        assert_eq!(config.kpi.top_n, DEFAULT_TOP_N);
        assert_eq!(config.timeline, TimelineRules::default());
        assert_eq!(config.max_events, DEFAULT_MAX_EVENTS);
    }

    #[test]
    fn rejects_empty_completion_set() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [timeline]
            required_for_completed = []
            "#,
        )
        .expect_err("empty completion set");
        assert!(matches!(err, PipelineError::InvalidRules(_)));
    }

    #[test]
    fn rejects_unknown_dimension() {
        assert!("warehouse".parse::<GroupDimension>().is_err());
        assert_eq!(
            "hour_bucket".parse::<GroupDimension>(),
            Ok(GroupDimension::CreatedHour)
        );
    }
}
