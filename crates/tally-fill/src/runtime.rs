//! FillRuntime — wires storage, registry, driver, recorder, and run locks
//! from a [`TallyConfig`]. The scheduling trigger calls into this.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tally_core::config::TallyConfig;
use tally_core::errors::{FillResult, RecoveryAction};
use tally_core::traits::storage::IStatStore;
use tally_storage::TallyStorageEngine;

use crate::driver::{FillDriver, RunOutcome};
use crate::fill_state::FillStateTracker;
use crate::lock::RunLock;
use crate::maintenance;
use crate::recorder::Recorder;
use crate::registry::Registry;
use crate::status::StatusReport;

pub struct FillRuntime {
    engine: Arc<TallyStorageEngine>,
    registry: Arc<Registry>,
    driver: FillDriver,
    recorder: Recorder,
    /// `None` for a private in-memory database without a configured lock dir.
    lock: Option<RunLock>,
}

impl FillRuntime {
    /// Open with the built-in catalog minus `fill.disabled_stats`.
    pub fn open(config: &TallyConfig) -> FillResult<Self> {
        let registry = Registry::builtin()?.without(&config.fill.disabled_stats)?;
        Self::with_registry(config, registry)
    }

    /// Open with a caller-supplied catalog.
    pub fn with_registry(config: &TallyConfig, registry: Registry) -> FillResult<Self> {
        let engine = Arc::new(TallyStorageEngine::from_config(&config.storage)?);
        let lock = match lock_dir(config, engine.path()) {
            Some(dir) => Some(RunLock::new(&dir)?),
            None => None,
        };

        let registry = Arc::new(registry);
        let store: Arc<dyn IStatStore> = engine.clone();
        let driver = FillDriver::new(store.clone(), registry.clone());
        let recorder = Recorder::new(store, registry.clone());

        info!(
            statistics = registry.len(),
            lock_dir = ?lock.as_ref().map(|l| l.dir().display().to_string()),
            "fill runtime ready"
        );
        Ok(Self {
            engine,
            registry,
            driver,
            recorder,
            lock,
        })
    }

    /// Advance one statistic to `now` floored to its frequency.
    pub fn advance(&self, property: &str, now: DateTime<Utc>) -> FillResult<RunOutcome> {
        let stat = self.registry.require(property)?;
        let target = stat.frequency.floor(now);
        self.locked(property, || self.driver.run(property, &target))
    }

    /// Advance every statistic in registry order.
    ///
    /// A statistic locked by another run is skipped with a warning; any
    /// other error stops the pass.
    pub fn advance_all(&self, now: DateTime<Utc>) -> FillResult<Vec<RunOutcome>> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for stat in self.registry.iter() {
            match self.advance(&stat.property, now) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if RecoveryAction::for_error(&e) == RecoveryAction::Ignore => {
                    warn!(property = %stat.property, error = %e, "skipping statistic");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcomes)
    }

    pub fn status(&self, now: DateTime<Utc>) -> FillResult<StatusReport> {
        Ok(StatusReport::build(&*self.engine, &self.registry, now)?)
    }

    pub fn last_successful_fill(&self, property: &str) -> FillResult<Option<DateTime<Utc>>> {
        let stat = self.registry.require(property)?;
        Ok(FillStateTracker::new(&*self.engine).last_successful_fill(stat)?)
    }

    pub fn clear_stat(&self, property: &str) -> FillResult<usize> {
        self.locked(property, || {
            maintenance::clear_stat(&*self.engine, &self.registry, property)
        })
    }

    /// [`Self::clear_stat`] for every registered statistic, each under its
    /// own run lock.
    pub fn clear_all(&self) -> FillResult<usize> {
        let mut removed = 0;
        for stat in self.registry.iter() {
            removed += self.clear_stat(&stat.property)?;
        }
        Ok(removed)
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn driver(&self) -> &FillDriver {
        &self.driver
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn engine(&self) -> &TallyStorageEngine {
        &self.engine
    }

    fn locked<T, F>(&self, property: &str, f: F) -> FillResult<T>
    where
        F: FnOnce() -> FillResult<T>,
    {
        match &self.lock {
            Some(lock) => lock.with_exclusive(property, f),
            None => f(),
        }
    }
}

/// Configured dir, else `<db dir>/locks`, else none for in-memory.
fn lock_dir(config: &TallyConfig, db_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = &config.fill.lock_dir {
        return Some(PathBuf::from(dir));
    }
    db_path.map(|p| {
        p.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join("locks")
    })
}

impl std::fmt::Debug for FillRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillRuntime")
            .field("db_path", &self.engine.path())
            .field("statistics", &self.registry.len())
            .finish()
    }
}
