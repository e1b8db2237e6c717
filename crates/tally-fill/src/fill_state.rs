//! Fill-state tracker: the per-statistic cursor and its state machine.
//!
//! ```text
//! (none) ──first read──▶ DONE@epoch
//! DONE@t ──begin bucket──▶ STARTED@t+step ──bucket committed──▶ DONE@t+step
//! STARTED@t ──next run──▶ undo rows at t ──▶ DONE@t-step
//! ```

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use tally_core::errors::StorageError;
use tally_core::traits::storage::IStatStore;
use tally_core::types::rows::{FillState, FillStatus};
use tally_core::types::time::Frequency;

use crate::registry::StatDefinition;

pub struct FillStateTracker<'a> {
    store: &'a dyn IStatStore,
}

impl<'a> FillStateTracker<'a> {
    pub fn new(store: &'a dyn IStatStore) -> Self {
        Self { store }
    }

    pub fn read(&self, property: &str) -> Result<Option<FillState>, StorageError> {
        self.store.get_fill_state(property)
    }

    pub fn commit(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        status: FillStatus,
    ) -> Result<(), StorageError> {
        self.store.upsert_fill_state(property, end_time, status)
    }

    /// Read the cursor, creating it at the installation epoch when absent.
    ///
    /// `None` means the installation has no tenants yet, so no epoch exists
    /// and nothing is written.
    pub fn read_or_create(&self, stat: &StatDefinition) -> Result<Option<FillState>, StorageError> {
        if let Some(state) = self.read(&stat.property)? {
            return Ok(Some(state));
        }
        let Some(epoch) = installation_epoch(self.store, stat.frequency)? else {
            return Ok(None);
        };
        self.commit(&stat.property, epoch, FillStatus::Done)?;
        info!(property = %stat.property, epoch = %epoch, "initialized fill state");
        self.read(&stat.property)
    }

    /// Return the cursor to resume from, undoing a STARTED bucket first.
    pub fn resume_point(
        &self,
        stat: &StatDefinition,
        state: &FillState,
    ) -> Result<DateTime<Utc>, StorageError> {
        match state.status {
            FillStatus::Done => Ok(state.end_time),
            FillStatus::Started => self.undo(stat, state.end_time),
        }
    }

    /// Delete the half-written bucket at `end_time` within the undo scope
    /// and move the cursor back one step as DONE.
    fn undo(
        &self,
        stat: &StatDefinition,
        end_time: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, StorageError> {
        let removed = self
            .store
            .delete_rows_at(&stat.property, end_time, stat.undo_scope.levels())?;
        let previous = stat.frequency.previous_boundary(end_time).ok_or_else(|| {
            StorageError::CorruptRow {
                table: "fill_state".to_string(),
                details: format!("{} has no bucket before {end_time}", stat.property),
            }
        })?;
        self.commit(&stat.property, previous, FillStatus::Done)?;
        info!(
            property = %stat.property,
            end_time = %end_time,
            rows_removed = removed,
            "undid interrupted bucket"
        );
        Ok(previous)
    }

    /// Newest bucket end known to be fully committed.
    pub fn last_successful_fill(
        &self,
        stat: &StatDefinition,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self
            .read(&stat.property)?
            .map(|state| last_successful_fill_of(&state, stat.step())))
    }
}

/// DONE: the recorded bucket. STARTED: the one before it, saturating at
/// the earliest representable instant.
pub fn last_successful_fill_of(state: &FillState, step: Duration) -> DateTime<Utc> {
    match state.status {
        FillStatus::Done => state.end_time,
        FillStatus::Started => state
            .end_time
            .checked_sub_signed(step)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
    }
}

/// Earliest tenant creation, floored to the day and then to `frequency`.
pub fn installation_epoch(
    store: &dyn IStatStore,
    frequency: Frequency,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    Ok(store
        .installation_epoch()?
        .map(|t| frequency.floor(Frequency::Day.floor(t))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tally_core::types::rows::{RowLevel, UndoScope};
    use tally_storage::queries::facts;
    use tally_storage::TallyStorageEngine;

    fn engine_with_tenant() -> TallyStorageEngine {
        let engine = TallyStorageEngine::open_in_memory().unwrap();
        let created = Utc.with_ymd_and_hms(2024, 2, 10, 15, 45, 0).unwrap();
        engine
            .with_writer(|conn| facts::insert_tenant(conn, 1, "acme", created))
            .unwrap();
        engine
    }

    fn hourly() -> StatDefinition {
        StatDefinition::logging(
            "h",
            Frequency::Hour,
            RowLevel::Tenant,
            UndoScope::above(RowLevel::Tenant),
        )
    }

    #[test]
    fn test_created_at_epoch_floored_to_day() {
        let engine = engine_with_tenant();
        let tracker = FillStateTracker::new(&engine);
        let state = tracker.read_or_create(&hourly()).unwrap().unwrap();
        assert_eq!(state.end_time, Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap());
        assert_eq!(state.status, FillStatus::Done);
    }

    #[test]
    fn test_no_tenants_means_no_state() {
        let engine = TallyStorageEngine::open_in_memory().unwrap();
        let tracker = FillStateTracker::new(&engine);
        assert!(tracker.read_or_create(&hourly()).unwrap().is_none());
        assert!(tracker.read("h").unwrap().is_none());
    }

    #[test]
    fn test_started_resumes_one_step_back() {
        let engine = engine_with_tenant();
        let tracker = FillStateTracker::new(&engine);
        let t = Utc.with_ymd_and_hms(2024, 2, 11, 5, 0, 0).unwrap();
        tracker.commit("h", t, FillStatus::Started).unwrap();

        let state = tracker.read("h").unwrap().unwrap();
        assert_eq!(tracker.last_successful_fill(&hourly()).unwrap(), Some(t - Duration::hours(1)));

        let resumed = tracker.resume_point(&hourly(), &state).unwrap();
        assert_eq!(resumed, t - Duration::hours(1));
        let state = tracker.read("h").unwrap().unwrap();
        assert_eq!(state.status, FillStatus::Done);
        assert_eq!(state.end_time, resumed);
    }

    #[test]
    fn test_started_at_earliest_instant_is_corrupt() {
        let engine = engine_with_tenant();
        let tracker = FillStateTracker::new(&engine);
        let first = Frequency::Hour.floor(DateTime::<Utc>::MIN_UTC);
        tracker.commit("h", first, FillStatus::Started).unwrap();

        let state = tracker.read("h").unwrap().unwrap();
        let err = tracker.resume_point(&hourly(), &state).unwrap_err();
        assert!(matches!(err, StorageError::CorruptRow { .. }));
        assert_eq!(last_successful_fill_of(&state, Duration::hours(1)), DateTime::<Utc>::MIN_UTC);
    }
}
