//! Grouped summation from finer aggregate levels into coarser ones.

use rusqlite::{params, Connection};
use tracing::debug;

use tally_core::errors::StorageError;
use tally_core::traits::storage::{RollUpCounts, RollUpPlan, RollUpStep};
use tally_core::types::rows::RowLevel;

use super::to_secs;

const USER_TO_TENANT: &str = "
    INSERT INTO tenant_counts (tenant_id, property, subgroup, end_time, value)
    SELECT tenant_id, ?1, subgroup, ?2, SUM(value)
    FROM user_counts
    WHERE property = ?1 AND end_time = ?2
    GROUP BY tenant_id, subgroup";

const CHANNEL_TO_TENANT: &str = "
    INSERT INTO tenant_counts (tenant_id, property, subgroup, end_time, value)
    SELECT tenant_id, ?1, subgroup, ?2, SUM(value)
    FROM channel_counts
    WHERE property = ?1 AND end_time = ?2
    GROUP BY tenant_id, subgroup";

const TENANT_TO_INSTALLATION: &str = "
    INSERT INTO installation_counts (property, subgroup, end_time, value)
    SELECT ?1, subgroup, ?2, SUM(value)
    FROM tenant_counts
    WHERE property = ?1 AND end_time = ?2
    GROUP BY subgroup";

/// Run every step of the plan in one transaction, in order.
pub fn roll_up(conn: &Connection, plan: &RollUpPlan) -> Result<RollUpCounts, StorageError> {
    let end = to_secs(plan.end_time);
    let tx = conn.unchecked_transaction()?;
    let mut counts = RollUpCounts::default();

    for step in &plan.steps {
        let sql = statement_for(*step)?;
        let written = tx.prepare_cached(sql)?.execute(params![plan.property, end])?;
        match step.to {
            RowLevel::Tenant => counts.tenant_rows += written,
            _ => counts.installation_rows += written,
        }
        debug!(
            property = %plan.property,
            end_time = %plan.end_time,
            from = %step.from,
            to = %step.to,
            rows = written,
            "roll-up step"
        );
    }

    tx.commit()?;
    Ok(counts)
}

fn statement_for(step: RollUpStep) -> Result<&'static str, StorageError> {
    match (step.from, step.to) {
        (RowLevel::User, RowLevel::Tenant) => Ok(USER_TO_TENANT),
        (RowLevel::Channel, RowLevel::Tenant) => Ok(CHANNEL_TO_TENANT),
        (RowLevel::Tenant, RowLevel::Installation) => Ok(TENANT_TO_INSTALLATION),
        (from, to) => Err(StorageError::NotSupported {
            operation: format!("roll-up {from} → {to}"),
            reason: "only user/channel → tenant and tenant → installation exist".to_string(),
        }),
    }
}
