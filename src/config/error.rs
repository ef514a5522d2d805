//! Configuration errors.

use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading the rules or secrets files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The file or its directory could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The file is not valid TOML.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the file, or `<inline>` for in-memory text.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        source: Arc<toml::de::Error>,
    },

    /// No Asana personal access token was configured.
    #[error("no Asana personal access token in the secrets file or environment")]
    MissingToken,
}

impl ConfigError {
    /// Wraps an I/O error for a path.
    pub fn read(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    /// Wraps a TOML parse error for a path.
    pub fn parse(path: impl Into<Utf8PathBuf>, err: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

/// A top-level entry of the rules file that cannot become a rule section.
///
/// Only the offending entry is skipped; the rest of the file still loads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SectionError {
    /// The entry is not a table.
    #[error("rule '{0}' must be a table")]
    NotATable(String),

    /// The section contains a nested table.
    #[error("rule '{section}' has nested table '{key}', only scalar and list values are supported")]
    NestedTable {
        /// Rule section identifier.
        section: String,
        /// Offending key.
        key: String,
    },
}

impl SectionError {
    /// Returns the identifier of the offending section.
    #[must_use]
    pub fn section_id(&self) -> &str {
        match self {
            Self::NotATable(section) | Self::NestedTable { section, .. } => section,
        }
    }
}

/// Errors raised while interpreting a single configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The value is not a recognised boolean.
    #[error("key '{key}' expects a boolean, got '{value}'")]
    InvalidBool {
        /// Configuration key.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The value is not an `HH:MM` clock time.
    #[error("key '{key}' expects a time as HH:MM, got '{value}'")]
    InvalidClockTime {
        /// Configuration key.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The value is not one of the accepted choices.
    #[error("key '{key}' has invalid value: {reason}")]
    InvalidChoice {
        /// Configuration key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}
