//! Rule sections and the scalar/list value grammar used inside them.

use super::ValueError;
use chrono::NaiveTime;
use std::collections::BTreeMap;

/// Parses a configuration boolean.
///
/// Accepts `1`, `yes`, `true`, `on` and `0`, `no`, `false`, `off`, in any
/// case. Returns `None` for anything else.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Splits an id list on newlines and commas, skipping blank entries.
///
/// # Examples
///
/// ```rust
/// use tasksweep::config::parse_id_list;
///
/// assert_eq!(parse_id_list("12, 34\n56,"), vec!["12", "34", "56"]);
/// ```
#[must_use]
pub fn parse_id_list(value: &str) -> Vec<String> {
    value
        .split(['\n', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Splits a name list on newlines only, trimming each entry and removing
/// surrounding quotes. Blank entries are skipped.
///
/// Names may contain commas, so commas never separate entries.
#[must_use]
pub fn parse_name_list(value: &str) -> Vec<String> {
    value
        .lines()
        .map(|line| line.trim().trim_matches(['\'', '"']).trim())
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parses an `HH:MM` clock time.
#[must_use]
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// One rule's configuration: its id plus raw key to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSection {
    id: String,
    values: BTreeMap<String, String>,
}

impl RuleSection {
    /// Creates an empty section. The id is trimmed.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: id.as_ref().trim().to_owned(),
            values: BTreeMap::new(),
        }
    }

    /// Adds or replaces a value. Keys are trimmed and lower-cased.
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a value. Keys are trimmed and lower-cased.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().trim().to_lowercase(), value.into());
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the configured keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the trimmed value of a key, treating blank values as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Returns a boolean value.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidBool`] when the value is not a boolean.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ValueError> {
        self.get(key)
            .map(|value| {
                parse_bool(value).ok_or_else(|| ValueError::InvalidBool {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })
            })
            .transpose()
    }

    /// Returns an `HH:MM` clock time value.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidClockTime`] when the value does not
    /// parse.
    pub fn get_clock_time(&self, key: &str) -> Result<Option<NaiveTime>, ValueError> {
        self.get(key)
            .map(|value| {
                parse_clock_time(value).ok_or_else(|| ValueError::InvalidClockTime {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })
            })
            .transpose()
    }

    /// Returns an id list; absent keys give an empty list.
    #[must_use]
    pub fn get_id_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(parse_id_list).unwrap_or_default()
    }

    /// Returns a name list; absent keys give an empty list.
    #[must_use]
    pub fn get_name_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(parse_name_list).unwrap_or_default()
    }

    /// Returns the keys not present in `known`.
    #[must_use]
    pub fn unknown_keys(&self, known: &[&str]) -> Vec<String> {
        self.keys()
            .filter(|key| !known.contains(key))
            .map(ToOwned::to_owned)
            .collect()
    }
}
