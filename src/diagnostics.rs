//! Diagnostics shared by the schema and plan linters.

use serde::Serialize;
use std::fmt;

/// Severity of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a warning was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    // Schema rules
    FkNoIndex,
    OrphanTable,
    NoPrimaryKey,
    WideTable,
    CircularDependency,

    // Plan rules
    SeqScanLarge,
    HighFilterRatio,
    RowEstimateOff,
    DiskSort,
    HashBatches,
    NestedLoopMany,
    LowCacheHit,
    Bottleneck,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FkNoIndex => "FK_NO_INDEX",
            Self::OrphanTable => "ORPHAN_TABLE",
            Self::NoPrimaryKey => "NO_PRIMARY_KEY",
            Self::WideTable => "WIDE_TABLE",
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
            Self::SeqScanLarge => "SEQ_SCAN_LARGE",
            Self::HighFilterRatio => "HIGH_FILTER_RATIO",
            Self::RowEstimateOff => "ROW_ESTIMATE_OFF",
            Self::DiskSort => "DISK_SORT",
            Self::HashBatches => "HASH_BATCHES",
            Self::NestedLoopMany => "NESTED_LOOP_MANY",
            Self::LowCacheHit => "LOW_CACHE_HIT",
            Self::Bottleneck => "BOTTLENECK",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding produced by a linter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub level: Level,
    pub code: WarningCode,
    pub message: String,
    /// SQL the user can run to address the finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Participating tables, for findings spanning several tables
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
}

impl Warning {
    pub fn new(level: Level, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            suggestion: None,
            table: None,
            column: None,
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Warning totals by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningCounts {
    pub total: usize,
    pub danger: usize,
    pub warning: usize,
    pub info: usize,
}

impl WarningCounts {
    pub fn add(&mut self, warning: &Warning) {
        self.total += 1;
        match warning.level {
            Level::Danger => self.danger += 1,
            Level::Warning => self.warning += 1,
            Level::Info => self.info += 1,
        }
    }

    pub fn has_danger(&self) -> bool {
        self.danger > 0
    }
}

impl<'a> FromIterator<&'a Warning> for WarningCounts {
    fn from_iter<I: IntoIterator<Item = &'a Warning>>(iter: I) -> Self {
        let mut counts = Self::default();
        for warning in iter {
            counts.add(warning);
        }
        counts
    }
}
