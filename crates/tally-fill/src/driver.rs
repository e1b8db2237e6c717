//! Driver — advances one statistic bucket by bucket to a target time.
//!
//! Per run: validate target, read (or create) the cursor, undo a STARTED
//! bucket, clamp by dependencies, then for each missing bucket oldest
//! first: STARTED, collect, roll up, DONE.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info};

use tally_core::errors::{ConfigError, FillResult};
use tally_core::traits::storage::IStatStore;
use tally_core::types::rows::FillStatus;

use crate::aggregator;
use crate::fill_state::FillStateTracker;
use crate::registry::{Registry, StatDefinition};
use crate::resolver::{Clamp, DependencyResolver};

/// What one `run` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The cursor moved from `from` to `to`, filling `buckets` buckets.
    /// Zero buckets is a normal completion.
    Completed {
        property: String,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        buckets: u32,
    },
    /// A dependency has never been filled. Nothing was written.
    Deferred { property: String, dependency: String },
    /// The installation has no tenants, so there is no epoch to start from.
    Skipped { property: String },
}

impl RunOutcome {
    pub fn property(&self) -> &str {
        match self {
            Self::Completed { property, .. }
            | Self::Deferred { property, .. }
            | Self::Skipped { property } => property,
        }
    }
}

pub struct FillDriver {
    store: Arc<dyn IStatStore>,
    registry: Arc<Registry>,
}

impl FillDriver {
    pub fn new(store: Arc<dyn IStatStore>, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Advance `property` up to `target`.
    ///
    /// A target that is not UTC or not on the statistic's boundary is a
    /// configuration error, returned before anything is read or written.
    pub fn run<Tz: TimeZone>(&self, property: &str, target: &DateTime<Tz>) -> FillResult<RunOutcome> {
        let stat = self.registry.require(property)?;
        let target = stat.frequency.validate_target(target)?;
        let store = &*self.store;
        let tracker = FillStateTracker::new(store);

        let Some(state) = tracker.read_or_create(stat)? else {
            info!(property = %stat.property, "no tenants yet, nothing to fill");
            return Ok(RunOutcome::Skipped {
                property: stat.property.clone(),
            });
        };
        let from = tracker.resume_point(stat, &state)?;

        let effective = if stat.dependencies.is_empty() {
            target
        } else {
            match DependencyResolver::new(&self.registry, store).clamp(stat, target)? {
                Clamp::Effective(t) => t,
                Clamp::Defer { dependency } => {
                    return Ok(RunOutcome::Deferred {
                        property: stat.property.clone(),
                        dependency,
                    })
                }
            }
        };

        let started = Instant::now();
        let mut current = from;
        let mut buckets = 0u32;
        loop {
            let next = stat.frequency.next_boundary(current).ok_or_else(|| {
                ConfigError::TimeOutOfRange {
                    time: current.to_rfc3339(),
                    frequency: stat.frequency,
                }
            })?;
            if next > effective {
                break;
            }
            self.fill_bucket(&tracker, stat, next)?;
            current = next;
            buckets += 1;
        }

        info!(
            property = %stat.property,
            from = %from,
            to = %current,
            target = %target,
            buckets,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fill run complete"
        );
        Ok(RunOutcome::Completed {
            property: stat.property.clone(),
            from,
            to: current,
            buckets,
        })
    }

    /// Run every statistic in registry order, each with `now` floored to
    /// its own frequency. Stops at the first error.
    pub fn run_all(&self, now: DateTime<Utc>) -> FillResult<Vec<RunOutcome>> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for stat in self.registry.iter() {
            outcomes.push(self.run(&stat.property, &stat.frequency.floor(now))?);
        }
        Ok(outcomes)
    }

    fn fill_bucket(
        &self,
        tracker: &FillStateTracker<'_>,
        stat: &StatDefinition,
        end_time: DateTime<Utc>,
    ) -> FillResult<()> {
        let started = Instant::now();
        tracker.commit(&stat.property, end_time, FillStatus::Started)?;

        let collected = match &stat.collector {
            Some(collector) => {
                let window = stat.interval.window_ending(end_time);
                collector.collect(&*self.store, &stat.property, &window)?
            }
            None => 0,
        };
        let rolled = aggregator::aggregate(&*self.store, stat, end_time)?;

        tracker.commit(&stat.property, end_time, FillStatus::Done)?;
        debug!(
            property = %stat.property,
            end_time = %end_time,
            rows = collected,
            tenant_rows = rolled.tenant_rows,
            installation_rows = rolled.installation_rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bucket filled"
        );
        Ok(())
    }
}
