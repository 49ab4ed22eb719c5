//! Record lifecycle state shared by every stored entity.

use serde::{Deserialize, Serialize};

/// Tagged lifecycle state.
///
/// Deleted records are retained for audit; every query filters on `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

impl RecordState {
    pub fn is_active(self) -> bool {
        self == RecordState::Active
    }

    pub fn is_deleted(self) -> bool {
        self == RecordState::Deleted
    }
}

impl core::fmt::Display for RecordState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordState::Active => f.write_str("active"),
            RecordState::Deleted => f.write_str("deleted"),
        }
    }
}
