//! Error types for timeframe parsing, due windows and name resolution.

use super::ResourceType;
use thiserror::Error;

/// Errors returned while parsing or resolving a timeframe expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeframeError {
    /// A component is missing its number or its unit key.
    #[error("malformed timeframe '{text}': {reason}")]
    Malformed {
        /// The full timeframe text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The unit key is not one of the recognised short or long forms.
    #[error("unrecognised unit '{unit}' in timeframe '{text}'")]
    UnknownUnit {
        /// The full timeframe text.
        text: String,
        /// The unrecognised unit key.
        unit: String,
    },

    /// The same unit appears more than once.
    #[error("unit '{unit}' appears more than once in timeframe '{text}'")]
    DuplicateUnit {
        /// The full timeframe text.
        text: String,
        /// The repeated unit, in its long form.
        unit: String,
    },

    /// Positive and negative components are mixed.
    #[error("timeframe '{0}' mixes positive and negative components")]
    MixedSigns(String),

    /// Resolving the timeframe left the representable date range.
    #[error("timeframe '{0}' resolves outside the supported date range")]
    OutOfRange(String),
}

/// Errors returned while building a due window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DueWindowError {
    /// A bound timeframe could not be parsed.
    #[error(transparent)]
    Timeframe(#[from] TimeframeError),

    /// `no due date` was combined with an explicit bound or assumed time.
    #[error("'no due date' cannot be combined with {0}")]
    TimeframeArgDupe(String),

    /// An assumed time was given for a bound that is absent.
    #[error("assumed time given for the {0} due bound, but that bound is not set")]
    AssumedTimeWithoutBound(&'static str),
}

/// Errors returned while looking up a resource identifier by name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// No resource with that name exists.
    #[error("the {resource} \"{name}\" was not found")]
    DataNotFound {
        /// Kind of resource searched.
        resource: ResourceType,
        /// Name or identifier searched for.
        name: String,
    },

    /// More than one resource shares that name.
    #[error("the {resource} \"{name}\" matched more than one id: {}", .ids.join(", "))]
    DuplicateName {
        /// Kind of resource searched.
        resource: ResourceType,
        /// Ambiguous name.
        name: String,
        /// Every matching identifier.
        ids: Vec<String>,
    },

    /// The name resolved to a different identifier than the one configured.
    #[error("the {resource} \"{name}\" has id {found}, but id {expected} was configured")]
    MismatchedData {
        /// Kind of resource searched.
        resource: ResourceType,
        /// Name searched for.
        name: String,
        /// Identifier found for the name.
        found: String,
        /// Identifier given in configuration.
        expected: String,
    },
}

/// Errors returned while resolving the allowed section set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SectionResolutionError {
    /// A section name could not be resolved to a single id.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Sections were both included and excluded.
    #[error(
        "sections cannot be both included and excluded; check ids: {}{}",
        .ids.join(", "),
        format_conflicting_names(.names)
    )]
    Conflict {
        /// Conflicting section identifiers.
        ids: Vec<String>,
        /// Configured names that resolved to conflicting identifiers.
        names: Vec<String>,
    },
}

fn format_conflicting_names(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!("; also check names: {}", names.join(", "))
    }
}
