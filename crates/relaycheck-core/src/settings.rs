//! Flat key-value settings.
//!
//! Values come from a dotenv file. Variables already present in the process
//! environment win over the file, the way `dotenv` loaders behave.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default settings file name.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Read access to a flat settings store.
pub trait SettingsSource {
    /// Returns the raw value of `key`, if set.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Where the settings were loaded from, for messages.
    fn origin(&self) -> Option<&Path> {
        None
    }

    /// Returns `key` as a boolean.
    ///
    /// `true`, `1`, `yes` and `on` (any case) are true; any other value is
    /// false. An absent key yields `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_string(key)
            .map_or(default, |value| parse_bool(&value))
    }

    /// Returns `key` as a base-10 integer, or `default` if absent or malformed.
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get_string(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// Parses a boolean setting value.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, String>,
    origin: Option<PathBuf>,
}

impl MapSettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from key-value pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            origin: None,
        }
    }

    /// Loads a dotenv file and overlays the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingsNotFound`] if the file does not exist, or
    /// [`Error::Settings`] if it cannot be opened.
    pub fn load_dotenv(path: impl AsRef<Path>) -> Result<Self> {
        let mut settings = Self::from_dotenv_file(path)?;
        settings.overlay(unicode_pairs(std::env::vars_os()));
        Ok(settings)
    }

    /// Loads a dotenv file without consulting the process environment.
    ///
    /// Lines that do not parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingsNotFound`] if the file does not exist, or
    /// [`Error::Settings`] if it cannot be opened.
    pub fn from_dotenv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SettingsNotFound(path.to_path_buf()));
        }

        let lines = dotenvy::from_path_iter(path).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })?;

        let mut values = HashMap::new();
        for item in lines {
            match item {
                Ok((key, value)) => {
                    values.insert(key, value);
                }
                Err(dotenvy::Error::Io(e)) => {
                    warn!(path = %path.display(), "stopped reading settings: {e}");
                    break;
                }
                Err(e) => warn!(path = %path.display(), "skipping settings line: {e}"),
            }
        }
        debug!(path = %path.display(), keys = values.len(), "loaded settings");

        Ok(Self {
            values,
            origin: Some(path.to_path_buf()),
        })
    }

    /// Replaces values with the given pairs.
    pub fn overlay<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.values.extend(pairs);
    }

    /// Sets one value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Keeps the pairs whose key and value are both valid Unicode.
fn unicode_pairs<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

impl SettingsSource for MapSettings {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

impl<T: SettingsSource + ?Sized> SettingsSource for &T {
    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }

    fn origin(&self) -> Option<&Path> {
        (**self).origin()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_truthy() {
        for value in ["true", "TRUE", "True", "1", "yes", "YES", "on", "On"] {
            assert!(parse_bool(value), "{value}");
        }
    }

    #[test]
    fn test_parse_bool_everything_else_is_false() {
        for value in ["false", "0", "no", "off", "", "enabled", "y", "2", " true"] {
            assert!(!parse_bool(value), "{value}");
        }
    }

    #[test]
    fn test_get_bool_default_only_when_absent() {
        let settings = MapSettings::from_pairs([("PRESENT", "maybe")]);
        assert!(!settings.get_bool("PRESENT", true));
        assert!(settings.get_bool("ABSENT", true));
        assert!(!settings.get_bool("ABSENT", false));
    }

    #[test]
    fn test_get_int() {
        let settings = MapSettings::from_pairs([("N", "42"), ("BAD", "4x2"), ("NEG", "-3")]);
        assert_eq!(settings.get_int("N", 1), 42);
        assert_eq!(settings.get_int("BAD", 1), 1);
        assert_eq!(settings.get_int("NEG", 1), -3);
        assert_eq!(settings.get_int("ABSENT", 7), 7);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MapSettings::from_dotenv_file(dir.path().join(".env")).unwrap_err();
        assert!(matches!(err, Error::SettingsNotFound(_)));
    }

    #[test]
    fn test_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# accounts\nACCOUNT_COUNT=2\nACCOUNT1_POP3_HOST=\"pop.example.com\"\nexport ACCOUNT1_ENABLED=yes\n",
        )
        .unwrap();

        let settings = MapSettings::from_dotenv_file(&path).unwrap();
        assert_eq!(settings.get_int("ACCOUNT_COUNT", 1), 2);
        assert_eq!(
            settings.get_string("ACCOUNT1_POP3_HOST").as_deref(),
            Some("pop.example.com")
        );
        assert!(settings.get_bool("ACCOUNT1_ENABLED", false));
        assert_eq!(settings.origin(), Some(path.as_path()));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "ACCOUNT_COUNT=1\nJUNK LINE WITHOUT EQUALS\nACCOUNT1_ENABLED=true\n",
        )
        .unwrap();

        let settings = MapSettings::from_dotenv_file(&path).unwrap();
        assert_eq!(settings.get_int("ACCOUNT_COUNT", 0), 1);
        assert!(settings.get_bool("ACCOUNT1_ENABLED", false));
        assert_eq!(settings.get_string("JUNK"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_environment_is_ignored() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("ACCOUNT_COUNT"), OsString::from("2")),
            (OsString::from("BROKEN"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![0xff]), OsString::from("x")),
        ];

        let mut settings = MapSettings::new();
        settings.overlay(unicode_pairs(vars));
        assert_eq!(settings.get_int("ACCOUNT_COUNT", 1), 2);
        assert_eq!(settings.get_string("BROKEN"), None);
    }

    #[test]
    fn test_load_dotenv_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RELAYCHECK_TEST_ONLY_KEY=present\n").unwrap();

        let settings = MapSettings::load_dotenv(&path).unwrap();
        assert_eq!(
            settings.get_string("RELAYCHECK_TEST_ONLY_KEY").as_deref(),
            Some("present")
        );
    }

    #[test]
    fn test_overlay_wins() {
        let mut settings = MapSettings::from_pairs([("ACCOUNT_COUNT", "2")]);
        settings.overlay([("ACCOUNT_COUNT".to_string(), "3".to_string())]);
        assert_eq!(settings.get_int("ACCOUNT_COUNT", 1), 3);
    }
}
