//! Producer-side recording for externally fed statistics.
//!
//! Producers call [`Recorder::record`] inline with their own work, so it
//! never returns an error: bad input and store failures are logged at
//! WARN and dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use tally_core::traits::storage::IStatStore;
use tally_core::types::rows::{AggregateRow, CountOwner};

use crate::registry::Registry;

#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn IStatStore>,
    registry: Arc<Registry>,
}

impl Recorder {
    pub fn new(store: Arc<dyn IStatStore>, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }

    /// Add `increment` to `owner`'s row for the bucket containing
    /// `event_time`, creating the row if needed.
    pub fn record(
        &self,
        owner: CountOwner,
        property: &str,
        subgroup: Option<&str>,
        event_time: DateTime<Utc>,
        increment: i64,
    ) {
        let Some(stat) = self.registry.get(property) else {
            warn!(property, "dropping increment for unknown statistic");
            return;
        };
        if !stat.is_logging() {
            warn!(property, "dropping increment for computed statistic");
            return;
        }
        if owner.level() != stat.output_level {
            warn!(
                property,
                owner_level = %owner.level(),
                expected = %stat.output_level,
                "dropping increment for owner at the wrong level"
            );
            return;
        }

        let Some(end_time) = stat.frequency.bucket_end_for(event_time) else {
            warn!(
                property,
                event_time = %event_time,
                "dropping increment with no representable bucket"
            );
            return;
        };

        let row = AggregateRow {
            owner,
            property: stat.property.clone(),
            subgroup: subgroup.map(str::to_string),
            end_time,
            value: increment,
        };
        if let Err(e) = self.store.increment_row(&row) {
            warn!(
                property,
                end_time = %row.end_time,
                error = %e,
                "failed to record increment"
            );
        }
    }
}
