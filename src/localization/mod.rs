//! Remote-driven localization
//!
//! [`LocalizationManager`] observes three database paths:
//!
//! | path             | value shape                          | notification                    |
//! |------------------|--------------------------------------|---------------------------------|
//! | `loc`            | `{language: {key: translation}}`     | `LocalizationChanged`           |
//! | `s_langs/images` | `{language: flag image name}`        | `LocalizationChanged`           |
//! | `s_langs/langs`  | `[language]`                         | `SupportedLanguagesListChanged` |
//!
//! Every value replaces the previous one; a disappeared or wrong-shaped value
//! clears it.

mod bundle;
mod data_source;
mod key;
mod manager;
mod notification;

#[cfg(test)]
mod bundle_test;

pub use bundle::*;
pub use data_source::*;
pub use key::*;
pub use manager::LocalizationManager;
pub use manager::LocalizationTable;
pub use notification::*;
