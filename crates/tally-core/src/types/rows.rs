//! Persisted row shapes: fill state and aggregate counts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress marker of a statistic's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStatus {
    /// The bucket at `end_time` and everything before it is committed.
    Done,
    /// The bucket at `end_time` was being written when the run stopped.
    Started,
}

impl FillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Started => "started",
        }
    }
}

impl FromStr for FillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(Self::Done),
            "started" => Ok(Self::Started),
            other => Err(format!("unknown fill status '{other}'")),
        }
    }
}

impl fmt::Display for FillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statistic's persisted cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillState {
    pub property: String,
    pub end_time: DateTime<Utc>,
    pub status: FillStatus,
    pub last_modified: DateTime<Utc>,
}

/// Granularity of an aggregate row, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowLevel {
    User,
    Channel,
    Tenant,
    Installation,
}

impl RowLevel {
    pub const ALL: [RowLevel; 4] = [
        RowLevel::User,
        RowLevel::Channel,
        RowLevel::Tenant,
        RowLevel::Installation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Tenant => "tenant",
            Self::Installation => "installation",
        }
    }

    /// User and channel rows are both finest-entity rows.
    pub fn is_finest(self) -> bool {
        matches!(self, Self::User | Self::Channel)
    }
}

impl fmt::Display for RowLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity owning one aggregate row.
///
/// Finest rows carry their tenant so the roll-up can group by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum CountOwner {
    User { user_id: i64, tenant_id: i64 },
    Channel { channel_id: i64, tenant_id: i64 },
    Tenant { tenant_id: i64 },
    Installation,
}

impl CountOwner {
    pub fn level(&self) -> RowLevel {
        match self {
            Self::User { .. } => RowLevel::User,
            Self::Channel { .. } => RowLevel::Channel,
            Self::Tenant { .. } => RowLevel::Tenant,
            Self::Installation => RowLevel::Installation,
        }
    }

    pub fn tenant_id(&self) -> Option<i64> {
        match self {
            Self::User { tenant_id, .. }
            | Self::Channel { tenant_id, .. }
            | Self::Tenant { tenant_id } => Some(*tenant_id),
            Self::Installation => None,
        }
    }
}

/// One aggregate value for (owner, property, subgroup, end_time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub owner: CountOwner,
    pub property: String,
    pub subgroup: Option<String>,
    pub end_time: DateTime<Utc>,
    pub value: i64,
}

impl AggregateRow {
    pub fn level(&self) -> RowLevel {
        self.owner.level()
    }
}

/// Levels whose rows are deleted when a STARTED bucket is undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoScope {
    levels: Vec<RowLevel>,
}

impl UndoScope {
    /// Every level. Right for computed statistics.
    pub fn all() -> Self {
        Self {
            levels: RowLevel::ALL.to_vec(),
        }
    }

    /// Only the levels strictly coarser than `level`, so rows written at
    /// `level` by producers survive an undo.
    pub fn above(level: RowLevel) -> Self {
        let levels = match level {
            RowLevel::User | RowLevel::Channel => vec![RowLevel::Tenant, RowLevel::Installation],
            RowLevel::Tenant => vec![RowLevel::Installation],
            RowLevel::Installation => Vec::new(),
        };
        Self { levels }
    }

    pub fn only(levels: &[RowLevel]) -> Self {
        let mut levels = levels.to_vec();
        levels.sort();
        levels.dedup();
        Self { levels }
    }

    pub fn levels(&self) -> &[RowLevel] {
        &self.levels
    }

    pub fn contains(&self, level: RowLevel) -> bool {
        self.levels.contains(&level)
    }
}
