use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::BundleLoader;
use super::LocalizationDataSource;
use super::Notification;
use super::NotificationCenter;
use super::StringBundle;
use crate::Database;
use crate::DatabaseObserver;
use crate::DatabasePath;
use crate::LocalizationConfig;
use crate::ObserverId;
use crate::Result;

/// Synced translations: `{language: {key: translation}}`
pub type LocalizationTable = HashMap<String, HashMap<String, String>>;

/// Which of the observed paths an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Concern {
    StringTable,
    LanguageIcons,
    SupportedLanguages,
}

#[derive(Debug)]
struct CurrentLanguage {
    language: String,
    bundle: Arc<StringBundle>,
}

/// Remote-driven translations
///
/// Observes the string table, the language icon map and the supported
/// languages list, keeps the latest version of each and broadcasts a
/// [`Notification`] on every change. Lookups fall back to the static bundle of
/// the current language, and keys missing from the synced table are reported
/// back to the database with an empty value.
///
/// The manager registers itself on construction and unregisters when dropped.
pub struct LocalizationManager {
    database: Arc<Database>,
    config: LocalizationConfig,
    data_source: Arc<dyn LocalizationDataSource>,
    bundles: Arc<dyn BundleLoader>,

    current: RwLock<CurrentLanguage>,

    localization_data: ArcSwap<LocalizationTable>,
    supported_languages: ArcSwap<Vec<String>>,
    language_icons: ArcSwap<HashMap<String, String>>,

    notifications: NotificationCenter,
}

impl std::fmt::Debug for LocalizationManager {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LocalizationManager")
            .field("current_language", &self.current.read().language)
            .field("supported_languages", &**self.supported_languages.load())
            .finish_non_exhaustive()
    }
}

impl LocalizationManager {
    /// Resolves the current language, loads its bundle and starts observing
    /// the localization paths.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or no bundle for the resolved language. Both
    /// are fatal at startup.
    pub fn new(
        database: Arc<Database>,
        config: LocalizationConfig,
        data_source: Arc<dyn LocalizationDataSource>,
        bundles: Arc<dyn BundleLoader>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let language = resolve_current_language(&config, data_source.as_ref());
        let bundle = bundles.load(&language).inspect_err(|e| {
            error!(%language, "Failed to load string bundle: {}", e);
        })?;

        info!(%language, "Localization manager started");

        let manager = Arc::new(Self {
            database,
            notifications: NotificationCenter::new(config.notification_capacity),
            supported_languages: ArcSwap::from_pointee(data_source.initially_supported_languages()),
            localization_data: ArcSwap::from_pointee(LocalizationTable::new()),
            language_icons: ArcSwap::from_pointee(HashMap::new()),
            current: RwLock::new(CurrentLanguage {
                language,
                bundle: Arc::new(bundle),
            }),
            config,
            data_source,
            bundles,
        });

        let observer: Arc<dyn DatabaseObserver> = manager.clone();
        manager.database.add_observer(&observer);

        Ok(manager)
    }

    /// Receives every notification posted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn current_language(&self) -> String {
        self.current.read().language.clone()
    }

    /// Switches the current language.
    ///
    /// The choice is persisted through the data source. Posts
    /// [`Notification::LocalizationChanged`], then
    /// [`Notification::LayoutDirectionChanged`] when the text direction flips.
    ///
    /// # Errors
    ///
    /// [`crate::LocalizationError::MissingBundle`] when `language` ships no
    /// bundle; the current language is left unchanged.
    pub fn set_current_language(
        &self,
        language: &str,
    ) -> Result<()> {
        let bundle = self.bundles.load(language).inspect_err(|e| {
            error!(%language, "Failed to load string bundle: {}", e);
        })?;

        let previous = {
            let mut current = self.current.write();
            current.bundle = Arc::new(bundle);
            std::mem::replace(&mut current.language, language.to_string())
        };

        self.data_source.store_language(language);

        info!(from = %previous, to = %language, "Current language changed");

        self.notifications.post(Notification::LocalizationChanged);
        if self.is_language_right_to_left(&previous) != self.is_language_right_to_left(language) {
            self.notifications.post(Notification::LayoutDirectionChanged);
        }

        Ok(())
    }

    pub fn is_current_language_right_to_left(&self) -> bool {
        self.is_language_right_to_left(&self.current.read().language)
    }

    /// Whether `language` (e.g. `ar`, `he-IL`) is written right to left
    pub fn is_language_right_to_left(
        &self,
        language: &str,
    ) -> bool {
        let primary = language.split(['-', '_']).next().unwrap_or(language);
        self.config
            .rtl_languages
            .iter()
            .any(|rtl| rtl.eq_ignore_ascii_case(primary))
    }

    /// Latest supported languages list
    pub fn supported_languages(&self) -> Vec<String> {
        (**self.supported_languages.load()).clone()
    }

    /// Flag image name of `language`, upper-cased
    pub fn flag_image_name(
        &self,
        language: &str,
    ) -> Option<String> {
        self.language_icons.load().get(language).map(|name| name.to_uppercase())
    }

    /// Translation of `key` in the current language.
    ///
    /// Looked up in the synced table under the normalized key (spaces become
    /// `_`, dots are removed). Falls back to the static bundle under the
    /// original key, then to `key` itself. A key missing from an existing
    /// synced table is reported under the missing localization path.
    pub fn localized_string(
        &self,
        key: &str,
    ) -> String {
        let (language, bundle) = {
            let current = self.current.read();
            (current.language.clone(), current.bundle.clone())
        };

        let normalized = normalize_key(key);

        if let Some(table) = self.localization_data.load().get(&language) {
            if let Some(value) = table.get(&normalized) {
                return value.clone();
            }

            warn!(%language, key = %normalized, "No synced translation for key");
            self.report_missing_key(&language, &normalized);
        }

        bundle.localized_string(key)
    }

    fn report_missing_key(
        &self,
        language: &str,
        key: &str,
    ) {
        let path = format!("{}/{}/{}", self.config.missing_localization_path, language, key);
        self.database.set_value(Some(Value::String(String::new())), &path);
    }

    fn concern(
        &self,
        path: &str,
    ) -> Option<Concern> {
        if path == self.config.string_table_path {
            Some(Concern::StringTable)
        } else if path == self.config.icons_path {
            Some(Concern::LanguageIcons)
        } else if path == self.config.languages_path {
            Some(Concern::SupportedLanguages)
        } else {
            None
        }
    }

    /// Replaces the table behind `concern`; `None` clears it
    fn update(
        &self,
        concern: Concern,
        value: Option<&Value>,
    ) {
        match concern {
            Concern::StringTable => {
                let table = value.and_then(|v| parse::<LocalizationTable>(v, concern)).unwrap_or_default();
                debug!(languages = table.len(), "String table replaced");
                self.localization_data.store(Arc::new(table));
                self.notifications.post(Notification::LocalizationChanged);
            }
            Concern::LanguageIcons => {
                let icons = value
                    .and_then(|v| parse::<HashMap<String, String>>(v, concern))
                    .unwrap_or_default();
                debug!(icons = icons.len(), "Language icons replaced");
                self.language_icons.store(Arc::new(icons));
                self.notifications.post(Notification::LocalizationChanged);
            }
            Concern::SupportedLanguages => {
                let languages = value.and_then(|v| parse::<Vec<String>>(v, concern)).unwrap_or_default();
                debug!(?languages, "Supported languages replaced");
                self.supported_languages.store(Arc::new(languages));
                self.notifications.post(Notification::SupportedLanguagesListChanged);
            }
        }
    }
}

impl DatabaseObserver for LocalizationManager {
    fn paths(&self) -> Vec<DatabasePath> {
        self.config.observed_paths()
    }

    fn value_changed(
        &self,
        value: &Value,
        path: &str,
    ) {
        match self.concern(path) {
            Some(concern) => self.update(concern, Some(value)),
            None => trace!(%path, "Ignoring value of an unrelated path"),
        }
    }

    fn value_disappeared(
        &self,
        path: &str,
    ) {
        match self.concern(path) {
            Some(concern) => self.update(concern, None),
            None => trace!(%path, "Ignoring disappearance of an unrelated path"),
        }
    }
}

impl Drop for LocalizationManager {
    fn drop(&mut self) {
        self.database.remove_observer_by_id(ObserverId::of_ref(self));
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    value: &Value,
    concern: Concern,
) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(?concern, "Unexpected value shape, treating as absent: {}", e);
            None
        }
    }
}

/// Stored language, else the first preferred language initially supported,
/// else the default language
pub(super) fn resolve_current_language(
    config: &LocalizationConfig,
    data_source: &dyn LocalizationDataSource,
) -> String {
    if let Some(stored) = data_source.stored_language() {
        return stored;
    }

    let supported = data_source.initially_supported_languages();
    config
        .preferred_languages
        .iter()
        .find(|language| supported.contains(language))
        .cloned()
        .unwrap_or_else(|| config.default_language.clone())
}

/// Spaces become `_`, dots are removed
pub(super) fn normalize_key(key: &str) -> String {
    key.replace(' ', "_").replace('.', "")
}
