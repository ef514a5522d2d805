//! Configuration loading.
//!
//! A configuration directory holds `rules.toml`, where every top-level
//! table is one rule, and an optional `secrets.toml` with tracker
//! credentials. Rule values reach rules as strings and are interpreted with
//! the helpers in this module.

mod error;
mod files;
mod values;

pub use error::{ConfigError, SectionError, ValueError};
pub use files::{ASANA_TOKEN_ENV, RULES_FILE_NAME, RulesConfig, SECRETS_FILE_NAME, Secrets};
pub use values::{RuleSection, parse_bool, parse_clock_time, parse_id_list, parse_name_list};

#[cfg(test)]
mod tests;
