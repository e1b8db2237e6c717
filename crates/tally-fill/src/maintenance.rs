//! Maintenance: wipe a statistic so the next run recomputes it from the
//! installation epoch.
//!
//! The cursor and the rows go in one store transaction. A failed clear
//! leaves the statistic exactly as it was.

use tracing::info;

use tally_core::errors::FillResult;
use tally_core::traits::storage::IStatStore;

use crate::registry::Registry;

/// Delete `property`'s fill state and its rows at every level.
/// Returns the number of rows removed. Dependents are not cleared.
pub fn clear_stat(store: &dyn IStatStore, registry: &Registry, property: &str) -> FillResult<usize> {
    let stat = registry.require(property)?;
    let cleared = store.clear_property(&stat.property)?;
    info!(
        property,
        had_state = cleared.had_state,
        rows_removed = cleared.rows_removed,
        "cleared statistic"
    );
    Ok(cleared.rows_removed)
}
