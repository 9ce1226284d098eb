//! Static string bundles
//!
//! A bundle is the shipped, offline translation table of one language. It is
//! the fallback for keys missing from the synchronized remote table.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::constants::BUNDLE_FILE_EXTENSION;
use crate::LocalizationError;
use crate::Result;

/// Static translations of one language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringBundle {
    language: String,
    strings: HashMap<String, String>,
}

impl StringBundle {
    pub fn new(
        language: impl Into<String>,
        strings: HashMap<String, String>,
    ) -> Self {
        Self {
            language: language.into(),
            strings,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Translation of `key`, or `key` itself when the bundle lacks it
    pub fn localized_string(
        &self,
        key: &str,
    ) -> String {
        self.get(key).unwrap_or(key).to_string()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Source of static bundles
#[cfg_attr(test, automock)]
pub trait BundleLoader: Send + Sync + 'static {
    /// Loads the bundle of `language`.
    ///
    /// # Errors
    ///
    /// [`LocalizationError::MissingBundle`] when the language ships no bundle.
    fn load(
        &self,
        language: &str,
    ) -> Result<StringBundle>;
}

/// Loads `{dir}/{language}.json` files holding a flat `{key: translation}` object
#[derive(Debug, Clone)]
pub struct DirectoryBundleLoader {
    dir: PathBuf,
}

impl DirectoryBundleLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn bundle_path(
        &self,
        language: &str,
    ) -> PathBuf {
        self.dir.join(format!("{language}.{BUNDLE_FILE_EXTENSION}"))
    }
}

impl BundleLoader for DirectoryBundleLoader {
    fn load(
        &self,
        language: &str,
    ) -> Result<StringBundle> {
        let path = self.bundle_path(language);
        debug!(path = %path.display(), "Loading string bundle");

        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LocalizationError::MissingBundle {
                    language: language.to_string(),
                }
            } else {
                LocalizationError::InvalidBundle {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let strings: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| LocalizationError::InvalidBundle {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(StringBundle::new(language, strings))
    }
}

/// Bundles held in memory, keyed by language
#[derive(Debug, Clone, Default)]
pub struct StaticBundles {
    bundles: HashMap<String, StringBundle>,
}

impl StaticBundles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the bundle of `language`
    pub fn with_bundle<K, V>(
        mut self,
        language: &str,
        strings: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let strings = strings.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.bundles.insert(language.to_string(), StringBundle::new(language, strings));
        self
    }
}

impl BundleLoader for StaticBundles {
    fn load(
        &self,
        language: &str,
    ) -> Result<StringBundle> {
        self.bundles.get(language).cloned().ok_or_else(|| {
            LocalizationError::MissingBundle {
                language: language.to_string(),
            }
            .into()
        })
    }
}
