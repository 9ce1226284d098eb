use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants;
use crate::Error;
use crate::Result;

/// Localization manager configuration
///
/// ```toml
/// [localization]
/// initially_supported_languages = ["en", "ar"]
/// preferred_languages = ["en"]
/// default_language = "en"
/// bundle_dir = "resources/lproj"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalizationConfig {
    /// Languages assumed supported before the remote list is loaded
    #[serde(default = "default_initially_supported_languages")]
    pub initially_supported_languages: Vec<String>,

    /// User preferred languages, most preferred first
    #[serde(default = "default_preferred_languages")]
    pub preferred_languages: Vec<String>,

    /// Language used when neither a stored nor a preferred language applies
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Directory holding one `{language}.json` static bundle per language
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: PathBuf,

    #[serde(default = "default_string_table_path")]
    pub string_table_path: String,

    #[serde(default = "default_languages_path")]
    pub languages_path: String,

    #[serde(default = "default_icons_path")]
    pub icons_path: String,

    /// Root of the missing translation write-back
    #[serde(default = "default_missing_localization_path")]
    pub missing_localization_path: String,

    /// Language codes written right to left
    #[serde(default = "default_rtl_languages")]
    pub rtl_languages: Vec<String>,

    /// Capacity of the notification broadcast channel
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            initially_supported_languages: default_initially_supported_languages(),
            preferred_languages: default_preferred_languages(),
            default_language: default_language(),
            bundle_dir: default_bundle_dir(),
            string_table_path: default_string_table_path(),
            languages_path: default_languages_path(),
            icons_path: default_icons_path(),
            missing_localization_path: default_missing_localization_path(),
            rtl_languages: default_rtl_languages(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

impl LocalizationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_language.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "localization.default_language must not be empty".into(),
            )));
        }

        let paths = [
            ("string_table_path", &self.string_table_path),
            ("languages_path", &self.languages_path),
            ("icons_path", &self.icons_path),
        ];
        for (name, path) in paths {
            if path.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(format!(
                    "localization.{name} must not be empty"
                ))));
            }
        }

        if self.string_table_path == self.languages_path
            || self.string_table_path == self.icons_path
            || self.languages_path == self.icons_path
        {
            return Err(Error::Config(ConfigError::Message(
                "localization observed paths must be distinct".into(),
            )));
        }

        if self.missing_localization_path.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "localization.missing_localization_path must not be empty".into(),
            )));
        }

        if self.notification_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "localization.notification_capacity must be greater than 0".into(),
            )));
        }

        Ok(())
    }

    /// Fixed set of observed paths: string table, icon map, language list
    pub fn observed_paths(&self) -> Vec<String> {
        vec![
            self.string_table_path.clone(),
            self.icons_path.clone(),
            self.languages_path.clone(),
        ]
    }
}

fn default_initially_supported_languages() -> Vec<String> {
    vec!["en".into(), "ar".into()]
}

fn default_preferred_languages() -> Vec<String> {
    vec![constants::DEFAULT_LANGUAGE.into()]
}

fn default_language() -> String {
    constants::DEFAULT_LANGUAGE.into()
}

fn default_bundle_dir() -> PathBuf {
    PathBuf::from("resources/lproj")
}

fn default_string_table_path() -> String {
    constants::LOCALIZATION.into()
}

fn default_languages_path() -> String {
    constants::SUPPORTED_LANGUAGES_LANGS.into()
}

fn default_icons_path() -> String {
    constants::SUPPORTED_LANGUAGES_IMAGES.into()
}

fn default_missing_localization_path() -> String {
    constants::MISSING_LOCALIZATION.into()
}

fn default_rtl_languages() -> Vec<String> {
    ["ar", "fa", "he", "ur", "ps", "yi", "dv", "ku", "sd", "ug"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_notification_capacity() -> usize {
    64
}
