//! Rules and secrets files.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use toml::{Table, Value};

use super::{ConfigError, RuleSection, SectionError};

/// File name of the rules file inside the configuration directory.
pub const RULES_FILE_NAME: &str = "rules.toml";
/// File name of the secrets file inside the configuration directory.
pub const SECRETS_FILE_NAME: &str = "secrets.toml";
/// Environment variable overriding the configured Asana token.
pub const ASANA_TOKEN_ENV: &str = "TASKSWEEP_ASANA_TOKEN";

const INLINE_SOURCE: &str = "<inline>";

/// Every rule section of a rules file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesConfig {
    sections: Vec<RuleSection>,
    malformed: Vec<SectionError>,
}

impl RulesConfig {
    /// Creates a configuration from prepared sections.
    #[must_use]
    pub const fn new(sections: Vec<RuleSection>) -> Self {
        Self {
            sections,
            malformed: Vec::new(),
        }
    }

    /// Parses rules file text.
    ///
    /// Every top-level table is one rule section. Scalars are stored in their
    /// string form and arrays of scalars are joined by newlines. Top-level
    /// scalars and sections holding nested tables are kept aside as
    /// [`SectionError`]s so the remaining rules still load.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Utf8Path::new(INLINE_SOURCE))
    }

    /// Reads `rules.toml` from a configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, and the
    /// parse errors of [`RulesConfig::from_toml_str`].
    pub fn load(config_dir: &Utf8Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(RULES_FILE_NAME);
        let text = read_file(config_dir, RULES_FILE_NAME)?;
        Self::parse(&text, &path)
    }

    /// Returns the sections in file order.
    #[must_use]
    pub fn sections(&self) -> &[RuleSection] {
        &self.sections
    }

    /// Returns the entries that could not become rule sections, in file
    /// order.
    #[must_use]
    pub fn malformed(&self) -> &[SectionError] {
        &self.malformed
    }

    fn parse(text: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        let table: Table = text
            .parse()
            .map_err(|err| ConfigError::parse(path, err))?;
        let mut config = Self::default();
        for (id, value) in &table {
            match section_from_value(id, value) {
                Ok(section) => config.sections.push(section),
                Err(err) => config.malformed.push(err),
            }
        }
        Ok(config)
    }
}

fn section_from_value(id: &str, value: &Value) -> Result<RuleSection, SectionError> {
    let Value::Table(entries) = value else {
        return Err(SectionError::NotATable(id.to_owned()));
    };
    let mut section = RuleSection::new(id);
    for (key, entry) in entries {
        let flattened = flatten_value(entry).ok_or_else(|| SectionError::NestedTable {
            section: section.id().to_owned(),
            key: key.clone(),
        })?;
        section.insert(key, flattened);
    }
    Ok(section)
}

fn flatten_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        Value::Datetime(moment) => Some(moment.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Table(_) => None,
                scalar => flatten_value(scalar),
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join("\n")),
        Value::Table(_) => None,
    }
}

/// Credentials for remote trackers.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    asana_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("asana_token", &self.asana_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Parses secrets file text.
    ///
    /// The token lives under `[asana] "personal access token"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Utf8Path::new(INLINE_SOURCE))
    }

    /// Reads `secrets.toml` from a configuration directory. A missing file
    /// yields empty secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] for unreadable files and
    /// [`ConfigError::Parse`] for invalid TOML.
    pub fn load(config_dir: &Utf8Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(SECRETS_FILE_NAME);
        match read_file(config_dir, SECRETS_FILE_NAME) {
            Ok(text) => Self::parse(&text, &path),
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the token to use, preferring a non-blank environment value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when neither source has one.
    pub fn asana_token(&self, env_override: Option<String>) -> Result<String, ConfigError> {
        env_override
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty())
            .or_else(|| self.asana_token.clone())
            .ok_or(ConfigError::MissingToken)
    }

    fn parse(text: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        let table: Table = text
            .parse()
            .map_err(|err| ConfigError::parse(path, err))?;
        let asana_token = table
            .get("asana")
            .and_then(|asana| asana.get("personal access token"))
            .and_then(Value::as_str)
            .map(|token| token.trim().trim_matches(['\'', '"']).to_owned())
            .filter(|token| !token.is_empty());
        Ok(Self { asana_token })
    }
}

fn read_file(config_dir: &Utf8Path, file_name: &str) -> Result<String, ConfigError> {
    let path: Utf8PathBuf = config_dir.join(file_name);
    let dir = Dir::open_ambient_dir(config_dir, ambient_authority())
        .map_err(|err| ConfigError::read(path.clone(), err))?;
    dir.read_to_string(file_name)
        .map_err(|err| ConfigError::read(path, err))
}
