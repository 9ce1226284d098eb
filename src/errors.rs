//! Error hierarchy for the observation layer
//!
//! Errors are grouped by the component that raises them. Redundant operations
//! (removing an unknown observer, adding the same observer twice) are never
//! errors, and remote write/subscribe failures stay inside the remote client.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database facade failures
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Localization manager failures
    #[error(transparent)]
    Localization(#[from] LocalizationError),

    /// Unrecoverable failures; the caller is expected to abort startup
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The facade was built without a remote data source
    #[error("Database data source is not set")]
    MissingDataSource,

    /// A worker thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LocalizationError {
    /// No static resource bundle exists for the language
    #[error("There is no bundle for {language} language")]
    MissingBundle { language: String },

    /// A bundle file exists but could not be read
    #[error("Bundle at {path} is invalid: {reason}")]
    InvalidBundle { path: String, reason: String },
}

impl Error {
    /// Configuration-class failures are fatal at construction time
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Fatal(_)
                | Error::Database(DatabaseError::MissingDataSource)
                | Error::Localization(LocalizationError::MissingBundle { .. })
        )
    }
}
