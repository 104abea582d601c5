use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metadata::FileKind;

/// A named, ordered, enable-able unit pairing a condition tree with an
/// action list, scoped to one watched folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub folder: PathBuf,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub stop_processing: bool,
    pub conditions: ConditionGroup,
    pub actions: Vec<Action>,
    /// Evaluation order within the owning folder. Unique and dense;
    /// see [`normalize_positions`](crate::rule::normalize_positions).
    #[serde(default)]
    pub position: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Rule {
    pub fn new(folder: PathBuf, name: impl Into<String>, conditions: ConditionGroup) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            folder,
            name: name.into(),
            enabled: true,
            stop_processing: false,
            conditions,
            actions: Vec::new(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn with_stop_processing(mut self, stop: bool) -> Self {
        self.stop_processing = stop;
        self
    }
}

/// Boolean tree of conditions combined under a match mode. Groups own their
/// children outright; recursion goes through the `nested` condition variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub match_type: MatchType,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new(match_type: MatchType, conditions: Vec<Condition>) -> Self {
        Self {
            match_type,
            conditions,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::new(MatchType::All, conditions)
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::new(MatchType::Any, conditions)
    }

    pub fn none(conditions: Vec<Condition>) -> Self {
        Self::new(MatchType::None, conditions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    All,
    Any,
    None,
}

/// One leaf predicate (or a nested group) inside a condition tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    Name {
        op: StringOp,
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Extension {
        op: StringOp,
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    FullName {
        op: StringOp,
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Size {
        #[serde(flatten)]
        op: SizeOp,
        unit: SizeUnit,
    },
    DateCreated {
        #[serde(flatten)]
        op: DateOp,
    },
    DateModified {
        #[serde(flatten)]
        op: DateOp,
    },
    DateAdded {
        #[serde(flatten)]
        op: DateOp,
    },
    CurrentTime {
        #[serde(flatten)]
        op: TimeOp,
    },
    Kind {
        op: KindOp,
        kind: FileKind,
    },
    /// Zero exit code means match. The command runs unsandboxed; rules are
    /// trusted input.
    ShellScript {
        command: String,
    },
    Nested {
        group: ConditionGroup,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringOp {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    Matches,
    DoesNotMatch,
}

impl StringOp {
    /// Operators whose value is interpreted as a regular expression.
    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Matches | Self::DoesNotMatch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum SizeOp {
    Equals { value: f64 },
    NotEquals { value: f64 },
    GreaterThan { value: f64 },
    LessThan { value: f64 },
    GreaterOrEqual { value: f64 },
    LessOrEqual { value: f64 },
    Between { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl SizeUnit {
    /// Binary multiplier (1 KB = 1024 bytes).
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kb => 1024,
            Self::Mb => 1024 * 1024,
            Self::Gb => 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DateOp {
    Is { date: NaiveDate },
    IsBefore { date: NaiveDate },
    IsAfter { date: NaiveDate },
    Between { start: NaiveDate, end: NaiveDate },
    InTheLast { amount: u32, unit: TimeUnit },
    NotInTheLast { amount: u32, unit: TimeUnit },
}

/// Clock-time operators. `between` treats a start later than its end as a
/// window wrapping past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum TimeOp {
    Is { time: NaiveTime },
    IsBefore { time: NaiveTime },
    IsAfter { time: NaiveTime },
    Between { start: NaiveTime, end: NaiveTime },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KindOp {
    Is,
    IsNot,
}

/// One step of the pipeline executed on a matched file. Destination, name
/// and command strings are token patterns, resolved immediately before the
/// step runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    Move {
        destination: String,
        #[serde(default)]
        on_conflict: ConflictResolution,
        #[serde(default)]
        skip_duplicates: bool,
    },
    Copy {
        destination: String,
        #[serde(default)]
        on_conflict: ConflictResolution,
        #[serde(default)]
        skip_duplicates: bool,
    },
    /// Like `move`, but the destination pattern is relative to the file's
    /// current parent folder.
    SortIntoSubfolder {
        destination: String,
        #[serde(default)]
        on_conflict: ConflictResolution,
        #[serde(default)]
        skip_duplicates: bool,
    },
    Rename {
        pattern: String,
        #[serde(default)]
        on_conflict: ConflictResolution,
    },
    Archive {
        destination: String,
        format: ArchiveFormat,
        #[serde(default)]
        delete_original: bool,
    },
    Unarchive {
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        delete_archive: bool,
    },
    /// Move to trash.
    Delete,
    /// Irreversible. Gated by `EngineSettings::allow_permanent_delete`.
    DeletePermanently,
    RunScript {
        command: String,
    },
    Notify {
        message: String,
    },
    Open,
    OpenWith {
        app: String,
    },
    ShowInFileManager,
    MakePdfSearchable,
    /// Halts further actions on this file for the given duration.
    Pause {
        seconds: u64,
    },
    /// No-op for the action list; signals the scheduler to proceed to the
    /// next rule regardless of `stopProcessing`.
    Continue,
    /// Terminates the action list for this file with no effect.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// Append a deterministic ` (n)` suffix and proceed.
    #[default]
    Rename,
    /// Overwrite the existing destination.
    Replace,
    /// Abandon this single action; the pipeline continues.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }
}
