//! Roll-up planning: which level-to-level summations a statistic needs.

use chrono::{DateTime, Utc};

use tally_core::errors::StorageError;
use tally_core::traits::storage::{IStatStore, RollUpCounts, RollUpPlan, RollUpStep};
use tally_core::types::rows::RowLevel;

use crate::registry::StatDefinition;

/// Finest → tenant (unless already tenant), then tenant → installation.
pub fn plan_for(stat: &StatDefinition, end_time: DateTime<Utc>) -> RollUpPlan {
    let mut steps = Vec::with_capacity(2);
    if stat.output_level.is_finest() {
        steps.push(RollUpStep {
            from: stat.output_level,
            to: RowLevel::Tenant,
        });
    }
    if stat.output_level != RowLevel::Installation {
        steps.push(RollUpStep {
            from: RowLevel::Tenant,
            to: RowLevel::Installation,
        });
    }
    RollUpPlan {
        property: stat.property.clone(),
        end_time,
        steps,
    }
}

/// Roll the bucket at `end_time` up in one store transaction.
pub fn aggregate(
    store: &dyn IStatStore,
    stat: &StatDefinition,
    end_time: DateTime<Utc>,
) -> Result<RollUpCounts, StorageError> {
    store.roll_up(&plan_for(stat, end_time))
}
