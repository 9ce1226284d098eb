// -
// Well-known database paths

/// Localization string table: `{language: {key: value}}`
pub const LOCALIZATION: &str = "loc";

/// Supported languages branch root
pub const SUPPORTED_LANGUAGES: &str = "s_langs";

/// Language code to flag image name map
pub const SUPPORTED_LANGUAGES_IMAGES: &str = "s_langs/images";

/// Ordered list of supported language codes
pub const SUPPORTED_LANGUAGES_LANGS: &str = "s_langs/langs";

/// Root under which missing translation keys are reported
pub const MISSING_LOCALIZATION: &str = "addLocalization";

pub const ERRORS: &str = "errors";

pub const COUNTRIES: &str = "Countries";

// -
// Worker threads

pub(crate) const EVENT_DISPATCHER_THREAD_NAME: &str = "watchdb-event-dispatcher";
pub(crate) const DELIVERY_WORKER_THREAD_NAME: &str = "watchdb-observers-delivery";

/// Fallback language when nothing else resolves
pub(crate) const DEFAULT_LANGUAGE: &str = "en";

/// Extension of static bundle files inside the bundle directory
pub(crate) const BUNDLE_FILE_EXTENSION: &str = "json";
