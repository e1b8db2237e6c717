//! Property: a run interrupted at any bucket, at any point inside that
//! bucket, and then resumed leaves exactly the rows of an uninterrupted run.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use tally_core::errors::StorageError;
use tally_core::traits::collector::{CollectorQuery, FactCollector};
use tally_core::traits::storage::{
    ClearedProperty, IAggregateStore, IFactSource, IFillStateStore, IStatStore, RollUpCounts,
    RollUpPlan,
};
use tally_core::types::rows::{AggregateRow, FillState, FillStatus, RowLevel};
use tally_core::types::time::{BucketWindow, Frequency};
use tally_fill::collectors::messages;
use tally_fill::{FillDriver, Registry, StatDefinition};
use tally_storage::queries::facts::{self, RecipientKind};
use tally_storage::TallyStorageEngine;

const PROPERTY: &str = "sent";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
}

/// Where inside a bucket the failure strikes.
#[derive(Debug, Clone, Copy)]
enum CrashPoint {
    AfterStarted,
    AfterCollect,
    AfterRollUp,
}

/// Store wrapper that fails one operation for one bucket.
struct FailingStore {
    inner: TallyStorageEngine,
    fail: Mutex<Option<(DateTime<Utc>, CrashPoint)>>,
}

impl FailingStore {
    fn trip(
        &self,
        end_time: DateTime<Utc>,
        point: fn(CrashPoint) -> bool,
    ) -> Result<(), StorageError> {
        let mut fail = self.fail.lock().unwrap();
        match *fail {
            Some((at, p)) if at == end_time && point(p) => {
                *fail = None;
                Err(StorageError::DbBusy)
            }
            _ => Ok(()),
        }
    }
}

impl IFillStateStore for FailingStore {
    fn get_fill_state(&self, property: &str) -> Result<Option<FillState>, StorageError> {
        self.inner.get_fill_state(property)
    }
    fn upsert_fill_state(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        status: FillStatus,
    ) -> Result<(), StorageError> {
        self.inner.upsert_fill_state(property, end_time, status)?;
        if status == FillStatus::Started {
            self.trip(end_time, |p| matches!(p, CrashPoint::AfterStarted))?;
        }
        Ok(())
    }
    fn delete_fill_state(&self, property: &str) -> Result<bool, StorageError> {
        self.inner.delete_fill_state(property)
    }
    fn list_fill_states(&self) -> Result<Vec<FillState>, StorageError> {
        self.inner.list_fill_states()
    }
}

impl IAggregateStore for FailingStore {
    fn insert_rows(&self, rows: &[AggregateRow]) -> Result<usize, StorageError> {
        self.inner.insert_rows(rows)
    }
    fn delete_rows_at(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        levels: &[RowLevel],
    ) -> Result<usize, StorageError> {
        self.inner.delete_rows_at(property, end_time, levels)
    }
    fn roll_up(&self, plan: &RollUpPlan) -> Result<RollUpCounts, StorageError> {
        let counts = self.inner.roll_up(plan)?;
        self.trip(plan.end_time, |p| matches!(p, CrashPoint::AfterRollUp))?;
        Ok(counts)
    }
    fn increment_row(&self, row: &AggregateRow) -> Result<(), StorageError> {
        self.inner.increment_row(row)
    }
    fn get_rows(
        &self,
        property: &str,
        level: RowLevel,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<AggregateRow>, StorageError> {
        self.inner.get_rows(property, level, end_time)
    }
    fn clear_property(&self, property: &str) -> Result<ClearedProperty, StorageError> {
        self.inner.clear_property(property)
    }
}

impl IFactSource for FailingStore {
    fn installation_epoch(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.inner.installation_epoch()
    }
    fn run_collector_query(
        &self,
        query: &CollectorQuery,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError> {
        let written = self.inner.run_collector_query(query, property, window)?;
        self.trip(window.end, |p| matches!(p, CrashPoint::AfterCollect))?;
        Ok(written)
    }
}

fn seeded_engine(messages: &[(i64, u32)]) -> TallyStorageEngine {
    let engine = TallyStorageEngine::open_in_memory().unwrap();
    engine
        .with_writer(|conn| {
            facts::insert_tenant(conn, 1, "a", start())?;
            facts::insert_tenant(conn, 2, "b", start())?;
            for user in 1..=4 {
                facts::insert_user(conn, user, if user <= 2 { 1 } else { 2 }, user == 4, start())?;
            }
            for &(sender, minute) in messages {
                let at = start() + Duration::minutes(i64::from(minute));
                facts::insert_message(conn, sender, None, RecipientKind::Direct, "web", at)?;
            }
            Ok(())
        })
        .unwrap();
    engine
}

fn registry() -> Arc<Registry> {
    let stat = StatDefinition::computed(
        PROPERTY,
        Frequency::Hour,
        Arc::new(messages::SENT_BY_SENDER_TYPE) as Arc<dyn FactCollector>,
    );
    Arc::new(Registry::new(vec![stat]).unwrap())
}

fn snapshot(store: &dyn IStatStore) -> Vec<Vec<AggregateRow>> {
    RowLevel::ALL
        .iter()
        .map(|&level| store.get_rows(PROPERTY, level, None).unwrap())
        .collect()
}

fn crash_point() -> impl Strategy<Value = CrashPoint> {
    prop_oneof![
        Just(CrashPoint::AfterStarted),
        Just(CrashPoint::AfterCollect),
        Just(CrashPoint::AfterRollUp),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_crash_then_resume_matches_clean_run(
        messages in prop::collection::vec((1i64..=4, 0u32..(8 * 60)), 0..40),
        crash_bucket in 1i64..=8,
        point in crash_point(),
    ) {
        let target = start() + Duration::hours(8);

        let clean = Arc::new(seeded_engine(&messages));
        FillDriver::new(clean.clone(), registry()).run(PROPERTY, &target).unwrap();

        let crash_at = start() + Duration::hours(crash_bucket);
        let failing = Arc::new(FailingStore {
            inner: seeded_engine(&messages),
            fail: Mutex::new(Some((crash_at, point))),
        });
        let driver = FillDriver::new(failing.clone(), registry());

        prop_assert!(driver.run(PROPERTY, &target).is_err());
        let state = failing.get_fill_state(PROPERTY).unwrap().unwrap();
        prop_assert_eq!(state.status, FillStatus::Started);
        prop_assert_eq!(state.end_time, crash_at);

        driver.run(PROPERTY, &target).unwrap();
        let state = failing.get_fill_state(PROPERTY).unwrap().unwrap();
        prop_assert_eq!((state.end_time, state.status), (target, FillStatus::Done));
        prop_assert_eq!(snapshot(&*failing), snapshot(&*clean));
    }
}
