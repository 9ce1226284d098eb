use std::fmt;

use super::LocalizationManager;

/// Translation key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Localization(String);

impl Localization {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Translation of this key in the manager's current language
    pub fn localized(
        &self,
        manager: &LocalizationManager,
    ) -> String {
        manager.localized_string(&self.0)
    }
}

impl From<&str> for Localization {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Localization {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for Localization {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
