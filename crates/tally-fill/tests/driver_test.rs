//! Driver scenarios: bucket filling, idempotence, boundary rejection,
//! dependency clamping, and crash recovery.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use tally_core::errors::{ConfigError, FillError, StorageError};
use tally_core::traits::collector::{CollectorQuery, FactCollector};
use tally_core::traits::storage::{IAggregateStore, IFillStateStore, IStatStore};
use tally_core::types::rows::{AggregateRow, CountOwner, FillStatus, RowLevel, UndoScope};
use tally_core::types::time::{BucketWindow, Frequency};
use tally_fill::collectors::messages;
use tally_fill::{FillDriver, Recorder, Registry, RunOutcome, StatDefinition};
use tally_storage::queries::facts::{self, RecipientKind};
use tally_storage::TallyStorageEngine;

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// Tenant 1 created at day 0 with users 1 and 2; messages on days 0 and 1.
fn seeded_engine() -> Arc<TallyStorageEngine> {
    let engine = TallyStorageEngine::open_in_memory().unwrap();
    engine
        .with_writer(|conn| {
            facts::insert_tenant(conn, 1, "acme", day(0))?;
            facts::insert_user(conn, 1, 1, false, day(0))?;
            facts::insert_user(conn, 2, 1, false, day(0))?;
            for (sender, client, at) in [
                (1, "web", day(0) + Duration::hours(3)),
                (1, "web", day(0) + Duration::hours(4)),
                (2, "mobile", day(0) + Duration::hours(5)),
                (1, "mobile", day(1) + Duration::hours(1)),
            ] {
                facts::insert_message(conn, sender, None, RecipientKind::Direct, client, at)?;
            }
            Ok(())
        })
        .unwrap();
    Arc::new(engine)
}

fn driver_for(engine: &Arc<TallyStorageEngine>, stats: Vec<StatDefinition>) -> FillDriver {
    let store: Arc<dyn IStatStore> = engine.clone();
    FillDriver::new(store, Arc::new(Registry::new(stats).unwrap()))
}

fn by_client() -> StatDefinition {
    StatDefinition::computed("by_client", Frequency::Day, Arc::new(messages::SENT_BY_CLIENT))
}

fn tenant_log(property: &str) -> StatDefinition {
    StatDefinition::logging(
        property,
        Frequency::Day,
        RowLevel::Tenant,
        UndoScope::above(RowLevel::Tenant),
    )
}

fn rows(engine: &TallyStorageEngine, property: &str, level: RowLevel) -> Vec<AggregateRow> {
    engine.get_rows(property, level, None).unwrap()
}

#[test]
fn test_fills_each_missing_bucket_once() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);

    let outcome = driver.run("by_client", &day(2)).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            property: "by_client".to_string(),
            from: day(0),
            to: day(2),
            buckets: 2,
        }
    );

    let state = engine.get_fill_state("by_client").unwrap().unwrap();
    assert_eq!((state.end_time, state.status), (day(2), FillStatus::Done));

    let user_rows = rows(&engine, "by_client", RowLevel::User);
    let keys: Vec<_> = user_rows
        .iter()
        .map(|r| (r.end_time, r.owner, r.subgroup.as_deref(), r.value))
        .collect();
    let user = |id| CountOwner::User { user_id: id, tenant_id: 1 };
    assert_eq!(
        keys,
        vec![
            (day(1), user(1), Some("web"), 2),
            (day(1), user(2), Some("mobile"), 1),
            (day(2), user(1), Some("mobile"), 1),
        ]
    );
    assert!(user_rows.iter().all(|r| r.end_time != day(0)));

    let installation = rows(&engine, "by_client", RowLevel::Installation);
    let totals: Vec<_> = installation
        .iter()
        .map(|r| (r.end_time, r.subgroup.as_deref(), r.value))
        .collect();
    assert_eq!(
        totals,
        vec![
            (day(1), Some("mobile"), 1),
            (day(1), Some("web"), 2),
            (day(2), Some("mobile"), 1),
        ]
    );
}

#[test]
fn test_second_run_to_same_target_changes_nothing() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);
    driver.run("by_client", &day(2)).unwrap();
    let before = rows(&engine, "by_client", RowLevel::Tenant);

    let outcome = driver.run("by_client", &day(2)).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { buckets: 0, .. }));
    assert_eq!(rows(&engine, "by_client", RowLevel::Tenant), before);

    // Target behind the cursor is also zero buckets.
    let outcome = driver.run("by_client", &day(1)).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { buckets: 0, .. }));
}

#[test]
fn test_misaligned_target_is_rejected_without_mutation() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);

    let err = driver
        .run("by_client", &(day(2) + Duration::hours(1)))
        .unwrap_err();
    assert!(matches!(err, FillError::Config(ConfigError::MisalignedTime { .. })));
    assert!(engine.get_fill_state("by_client").unwrap().is_none());
}

#[test]
fn test_non_utc_target_is_rejected_without_mutation() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let target = tz.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

    let err = driver.run("by_client", &target).unwrap_err();
    assert!(matches!(err, FillError::Config(ConfigError::NonUtcTime { .. })));
    assert!(engine.get_fill_state("by_client").unwrap().is_none());
}

#[test]
fn test_last_representable_target_is_rejected_without_mutation() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);
    let last = Frequency::Day.floor(DateTime::<Utc>::MAX_UTC);

    let err = driver.run("by_client", &last).unwrap_err();
    assert!(matches!(err, FillError::Config(ConfigError::TimeOutOfRange { .. })));
    assert!(engine.get_fill_state("by_client").unwrap().is_none());
}

#[test]
fn test_cursor_at_last_bucket_errors_instead_of_overflowing() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);
    let last = Frequency::Day.floor(DateTime::<Utc>::MAX_UTC);
    engine
        .upsert_fill_state("by_client", last, FillStatus::Done)
        .unwrap();

    let err = driver.run("by_client", &day(2)).unwrap_err();
    assert!(matches!(err, FillError::Config(ConfigError::TimeOutOfRange { .. })));
    let state = engine.get_fill_state("by_client").unwrap().unwrap();
    assert_eq!(state.end_time, last);
}

#[test]
fn test_unknown_statistic_is_a_config_error() {
    let engine = seeded_engine();
    let driver = driver_for(&engine, vec![by_client()]);
    let err = driver.run("nope", &day(1)).unwrap_err();
    assert!(matches!(err, FillError::Config(ConfigError::UnknownStatistic(_))));
}

#[test]
fn test_no_tenants_is_skipped() {
    let engine = Arc::new(TallyStorageEngine::open_in_memory().unwrap());
    let driver = driver_for(&engine, vec![by_client()]);
    let outcome = driver.run("by_client", &day(3)).unwrap();
    assert_eq!(outcome, RunOutcome::Skipped { property: "by_client".to_string() });
    assert!(engine.get_fill_state("by_client").unwrap().is_none());
}

#[test]
fn test_dependent_stops_at_dependency_progress() {
    let engine = seeded_engine();
    let driver = driver_for(
        &engine,
        vec![tenant_log("prereq"), tenant_log("derived").depends_on("prereq")],
    );
    engine.upsert_fill_state("prereq", day(1), FillStatus::Done).unwrap();
    engine.upsert_fill_state("derived", day(0), FillStatus::Done).unwrap();

    let outcome = driver.run("derived", &day(5)).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { to, buckets: 1, .. } if to == day(1)));
    assert_eq!(engine.get_fill_state("derived").unwrap().unwrap().end_time, day(1));
}

#[test]
fn test_unfilled_dependency_defers() {
    let engine = seeded_engine();
    let driver = driver_for(
        &engine,
        vec![tenant_log("prereq"), tenant_log("derived").depends_on("prereq")],
    );

    let outcome = driver.run("derived", &day(5)).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Deferred {
            property: "derived".to_string(),
            dependency: "prereq".to_string(),
        }
    );
}

#[test]
fn test_run_all_goes_in_registry_order() {
    let engine = seeded_engine();
    let driver = driver_for(
        &engine,
        vec![tenant_log("prereq"), tenant_log("derived").depends_on("prereq")],
    );
    let outcomes = driver.run_all(day(3) + Duration::hours(7)).unwrap();
    assert_eq!(outcomes.len(), 2);
    for outcome in outcomes {
        assert!(matches!(outcome, RunOutcome::Completed { to, buckets: 3, .. } if to == day(3)));
    }
}

/// Writes its rows, then fails once at the configured bucket end.
#[derive(Debug)]
struct CrashingCollector {
    inner: CollectorQuery,
    crash_at: Mutex<Option<DateTime<Utc>>>,
}

impl FactCollector for CrashingCollector {
    fn name(&self) -> &str {
        "crashing"
    }

    fn output_level(&self) -> RowLevel {
        self.inner.output_level
    }

    fn collect(
        &self,
        store: &dyn IStatStore,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError> {
        let written = self.inner.collect(store, property, window)?;
        let mut crash_at = self.crash_at.lock().unwrap();
        if *crash_at == Some(window.end) {
            *crash_at = None;
            return Err(StorageError::SqliteError {
                message: "connection lost".to_string(),
            });
        }
        Ok(written)
    }
}

#[test]
fn test_crash_mid_bucket_resumes_to_identical_rows() {
    let clean = seeded_engine();
    driver_for(&clean, vec![by_client()]).run("by_client", &day(2)).unwrap();

    let engine = seeded_engine();
    let collector = Arc::new(CrashingCollector {
        inner: messages::SENT_BY_CLIENT,
        crash_at: Mutex::new(Some(day(2))),
    });
    let driver = driver_for(
        &engine,
        vec![StatDefinition::computed("by_client", Frequency::Day, collector)],
    );

    let err = driver.run("by_client", &day(2)).unwrap_err();
    assert!(matches!(err, FillError::Storage(_)));
    let state = engine.get_fill_state("by_client").unwrap().unwrap();
    assert_eq!((state.end_time, state.status), (day(2), FillStatus::Started));
    assert!(!engine.get_rows("by_client", RowLevel::User, Some(day(2))).unwrap().is_empty());

    let outcome = driver.run("by_client", &day(2)).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { from, buckets: 1, .. } if from == day(1)));

    for level in RowLevel::ALL {
        assert_eq!(rows(&engine, "by_client", level), rows(&clean, "by_client", level));
    }
}

#[test]
fn test_undo_of_logging_stat_keeps_producer_rows() {
    let engine = seeded_engine();
    let stat = StatDefinition::logging(
        "reads",
        Frequency::Hour,
        RowLevel::User,
        UndoScope::above(RowLevel::User),
    );
    let registry = Arc::new(Registry::new(vec![stat]).unwrap());
    let store: Arc<dyn IStatStore> = engine.clone();
    let driver = FillDriver::new(store.clone(), registry.clone());
    let recorder = Recorder::new(store, registry);

    let user = CountOwner::User { user_id: 1, tenant_id: 1 };
    recorder.record(user, "reads", None, day(0) + Duration::minutes(10), 3);
    recorder.record(user, "reads", None, day(0) + Duration::minutes(50), 2);

    // Simulate a crash after the tenant roll-up of the first hour.
    let first_hour = day(0) + Duration::hours(1);
    engine.upsert_fill_state("reads", first_hour, FillStatus::Started).unwrap();
    engine
        .insert_rows(&[AggregateRow {
            owner: CountOwner::Tenant { tenant_id: 1 },
            property: "reads".to_string(),
            subgroup: None,
            end_time: first_hour,
            value: 5,
        }])
        .unwrap();

    driver.run("reads", &(day(0) + Duration::hours(2))).unwrap();

    let user_rows = rows(&engine, "reads", RowLevel::User);
    assert_eq!(user_rows.len(), 1);
    assert_eq!(user_rows[0].value, 5);
    let tenant = rows(&engine, "reads", RowLevel::Tenant);
    assert_eq!(tenant.len(), 1);
    assert_eq!((tenant[0].end_time, tenant[0].value), (first_hour, 5));
    let installation = rows(&engine, "reads", RowLevel::Installation);
    assert_eq!(installation.len(), 1);
    assert_eq!(installation[0].value, 5);
}
