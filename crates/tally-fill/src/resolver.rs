//! Dependency resolver: caps an advance at what prerequisites completed.

use chrono::{DateTime, Utc};
use tracing::info;

use tally_core::errors::FillResult;
use tally_core::traits::storage::IStatStore;

use crate::fill_state::FillStateTracker;
use crate::registry::{Registry, StatDefinition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clamp {
    /// Advance no further than this bucket end.
    Effective(DateTime<Utc>),
    /// A dependency has never been filled.
    Defer { dependency: String },
}

pub struct DependencyResolver<'a> {
    registry: &'a Registry,
    tracker: FillStateTracker<'a>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a Registry, store: &'a dyn IStatStore) -> Self {
        Self {
            registry,
            tracker: FillStateTracker::new(store),
        }
    }

    /// `min(requested, each dependency's last successful fill)`, with the
    /// dependency times floored to `stat`'s frequency.
    pub fn clamp(&self, stat: &StatDefinition, requested: DateTime<Utc>) -> FillResult<Clamp> {
        let mut effective = requested;
        for dependency in &stat.dependencies {
            let dep = self.registry.require(dependency)?;
            match self.tracker.last_successful_fill(dep)? {
                Some(done) => effective = effective.min(stat.frequency.floor(done)),
                None => {
                    info!(
                        property = %stat.property,
                        dependency = %dependency,
                        "dependency has no fill state yet, deferring"
                    );
                    return Ok(Clamp::Defer {
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(Clamp::Effective(effective))
    }
}
