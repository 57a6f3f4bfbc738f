use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::spec::PromptSpec;

/// The kind of mutation a version row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionAction {
    Insert,
    Update,
}

impl VersionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl fmt::Display for VersionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a spec taken when it was inserted or updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRow {
    pub version_seq: i64,
    pub action: VersionAction,
    pub occurred_at: Option<DateTime<Utc>>,
    pub spec: PromptSpec,
}

/// What a single upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub action: VersionAction,
    pub version_seq: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_text() {
        for action in [VersionAction::Insert, VersionAction::Update] {
            assert_eq!(VersionAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(VersionAction::parse("delete"), None);
        assert_eq!(VersionAction::Update.to_string(), "update");
    }
}
