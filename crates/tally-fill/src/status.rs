//! Operational status: where every statistic's cursor stands and how far
//! behind `now` it is. Serializes to JSON for health checks.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

use tally_core::errors::StorageError;
use tally_core::traits::storage::IStatStore;
use tally_core::types::rows::{FillState, FillStatus};
use tally_core::types::time::Frequency;

use crate::fill_state::last_successful_fill_of;
use crate::registry::{Registry, StatDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatStatus {
    pub property: String,
    pub frequency: Frequency,
    pub logging: bool,
    /// `None` until the first run creates the cursor.
    pub state: Option<FillStatus>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_successful_fill: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Whole buckets between the last successful fill and `now` floored.
    pub lag_buckets: Option<i64>,
}

impl StatStatus {
    fn new(stat: &StatDefinition, state: Option<&FillState>, now: DateTime<Utc>) -> Self {
        let last = state.map(|s| last_successful_fill_of(s, stat.step()));
        let lag_buckets = last.map(|done| {
            let behind = stat.frequency.floor(now) - done;
            (behind.num_seconds() / stat.step().num_seconds()).max(0)
        });
        Self {
            property: stat.property.clone(),
            frequency: stat.frequency,
            logging: stat.is_logging(),
            state: state.map(|s| s.status),
            end_time: state.map(|s| s.end_time),
            last_successful_fill: last,
            last_modified: state.map(|s| s.last_modified),
            lag_buckets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub stats: Vec<StatStatus>,
}

impl StatusReport {
    /// One entry per registered statistic, in registry order.
    pub fn build(
        store: &dyn IStatStore,
        registry: &Registry,
        now: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        let states: FxHashMap<String, FillState> = store
            .list_fill_states()?
            .into_iter()
            .map(|s| (s.property.clone(), s))
            .collect();
        let stats = registry
            .iter()
            .map(|stat| StatStatus::new(stat, states.get(&stat.property), now))
            .collect();
        Ok(Self {
            generated_at: now,
            stats,
        })
    }

    pub fn get(&self, property: &str) -> Option<&StatStatus> {
        self.stats.iter().find(|s| s.property == property)
    }

    /// Statistics never filled or more than `max_lag` buckets behind.
    pub fn lagging(&self, max_lag: i64) -> impl Iterator<Item = &StatStatus> {
        self.stats
            .iter()
            .filter(move |s| s.lag_buckets.map_or(true, |lag| lag > max_lag))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
