//! Where a moved task lands inside its destination section.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Insertion point for a move directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    /// Insert at the top of the section.
    #[default]
    Top,
    /// Insert at the bottom of the section.
    Bottom,
}

impl InsertPosition {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned while parsing an insertion point.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown insert position '{0}', expected 'top' or 'bottom'")]
pub struct ParseInsertPositionError(pub String);

impl TryFrom<&str> for InsertPosition {
    type Error = ParseInsertPositionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(ParseInsertPositionError(value.to_owned())),
        }
    }
}
