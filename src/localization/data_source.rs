use parking_lot::RwLock;

#[cfg(test)]
use mockall::automock;

/// Supplies the languages known before the remote list loads, and persists
/// the user's language choice
#[cfg_attr(test, automock)]
pub trait LocalizationDataSource: Send + Sync + 'static {
    fn initially_supported_languages(&self) -> Vec<String>;

    /// Previously stored language, if any
    fn stored_language(&self) -> Option<String>;

    fn store_language(
        &self,
        language: &str,
    );
}

/// Keeps the language choice for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryLanguageStore {
    initially_supported: Vec<String>,
    language: RwLock<Option<String>>,
}

impl MemoryLanguageStore {
    pub fn new(
        initially_supported: Vec<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            initially_supported,
            language: RwLock::new(language),
        }
    }
}

impl LocalizationDataSource for MemoryLanguageStore {
    fn initially_supported_languages(&self) -> Vec<String> {
        self.initially_supported.clone()
    }

    fn stored_language(&self) -> Option<String> {
        self.language.read().clone()
    }

    fn store_language(
        &self,
        language: &str,
    ) {
        *self.language.write() = Some(language.to_string());
    }
}
