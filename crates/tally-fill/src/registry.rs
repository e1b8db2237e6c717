//! Statistic definitions and the validated, ordered registry.
//!
//! The registry is an explicit value. Nothing here is global. Declaration
//! order is the scheduling order, so every dependency must be declared
//! before its dependents, which also rules out cycles.

use std::sync::Arc;

use chrono::Duration;
use rustc_hash::FxHashMap;

use tally_core::errors::ConfigError;
use tally_core::traits::collector::FactCollector;
use tally_core::types::rows::{RowLevel, UndoScope};
use tally_core::types::time::{Frequency, Interval};

use crate::collectors;

/// One statistic: what it computes, how often, and at which granularity.
#[derive(Debug, Clone)]
pub struct StatDefinition {
    pub property: String,
    pub frequency: Frequency,
    pub interval: Interval,
    /// `None` for externally fed (logging) statistics.
    pub collector: Option<Arc<dyn FactCollector>>,
    pub dependencies: Vec<String>,
    /// Level the collector or producers write.
    pub output_level: RowLevel,
    /// Levels deleted when a STARTED bucket is undone.
    pub undo_scope: UndoScope,
}

impl StatDefinition {
    /// A statistic computed from raw facts by `collector`.
    ///
    /// Interval defaults to one frequency step; undo covers every level.
    pub fn computed(
        property: impl Into<String>,
        frequency: Frequency,
        collector: Arc<dyn FactCollector>,
    ) -> Self {
        Self {
            property: property.into(),
            frequency,
            interval: Interval::of(frequency),
            output_level: collector.output_level(),
            collector: Some(collector),
            dependencies: Vec::new(),
            undo_scope: UndoScope::all(),
        }
    }

    /// A statistic whose `output_level` rows are written by producers.
    ///
    /// The undo scope is mandatory: it decides whether producer rows
    /// survive a crash recovery.
    pub fn logging(
        property: impl Into<String>,
        frequency: Frequency,
        output_level: RowLevel,
        undo_scope: UndoScope,
    ) -> Self {
        Self {
            property: property.into(),
            frequency,
            interval: Interval::of(frequency),
            collector: None,
            dependencies: Vec::new(),
            output_level,
            undo_scope,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn is_logging(&self) -> bool {
        self.collector.is_none()
    }

    pub fn step(&self) -> Duration {
        self.frequency.step()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidDefinition {
            property: self.property.clone(),
            reason: reason.to_string(),
        };

        if self.property.trim().is_empty() {
            return Err(invalid("property must not be empty"));
        }
        if !self.interval.is_positive() {
            return Err(invalid("interval must be positive"));
        }
        if self.output_level == RowLevel::Installation {
            return Err(invalid("output level must be user, channel, or tenant"));
        }
        if let Some(collector) = &self.collector {
            if collector.output_level() != self.output_level {
                return Err(invalid(&format!(
                    "collector {} writes {} rows but the statistic outputs {} rows",
                    collector.name(),
                    collector.output_level(),
                    self.output_level
                )));
            }
        }
        Ok(())
    }
}

/// Ordered, validated collection of statistic definitions.
#[derive(Debug, Clone)]
pub struct Registry {
    stats: Vec<StatDefinition>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    /// Validate and index `stats`.
    ///
    /// Rejects duplicates, invalid definitions, unknown dependencies, and
    /// dependencies declared after their dependents.
    pub fn new(stats: Vec<StatDefinition>) -> Result<Self, ConfigError> {
        let mut index = FxHashMap::default();
        for (position, stat) in stats.iter().enumerate() {
            stat.validate()?;
            if index.insert(stat.property.clone(), position).is_some() {
                return Err(ConfigError::DuplicateStatistic(stat.property.clone()));
            }
        }

        for (position, stat) in stats.iter().enumerate() {
            for dependency in &stat.dependencies {
                match index.get(dependency) {
                    None => {
                        return Err(ConfigError::UnknownDependency {
                            property: stat.property.clone(),
                            dependency: dependency.clone(),
                        })
                    }
                    Some(&dep_position) if dep_position >= position => {
                        return Err(ConfigError::DependencyOrder {
                            property: stat.property.clone(),
                            dependency: dependency.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self { stats, index })
    }

    /// The standard catalog.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(collectors::builtin_definitions())
    }

    /// A copy without the named statistics, re-validated.
    ///
    /// Naming an unknown statistic is an error, and so is leaving a
    /// dependent enabled while disabling its dependency.
    pub fn without(&self, disabled: &[String]) -> Result<Self, ConfigError> {
        if let Some(unknown) = disabled.iter().find(|p| !self.index.contains_key(*p)) {
            return Err(ConfigError::UnknownStatistic(unknown.clone()));
        }
        let kept = self
            .stats
            .iter()
            .filter(|stat| !disabled.contains(&stat.property))
            .cloned()
            .collect();
        Self::new(kept)
    }

    pub fn get(&self, property: &str) -> Option<&StatDefinition> {
        self.index.get(property).map(|&i| &self.stats[i])
    }

    pub fn require(&self, property: &str) -> Result<&StatDefinition, ConfigError> {
        self.get(property)
            .ok_or_else(|| ConfigError::UnknownStatistic(property.to_string()))
    }

    /// Definitions in declaration (scheduling) order.
    pub fn iter(&self) -> impl Iterator<Item = &StatDefinition> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
