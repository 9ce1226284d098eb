use std::fs;

use tempfile::tempdir;

use super::*;
use crate::Error;
use crate::LocalizationError;

#[test]
fn bundle_lookup_should_fall_back_to_key() {
    let bundles = StaticBundles::new().with_bundle("en", [("hello", "Hello")]);
    let bundle = bundles.load("en").unwrap();

    assert_eq!(bundle.language(), "en");
    assert_eq!(bundle.localized_string("hello"), "Hello");
    assert_eq!(bundle.localized_string("unknown key"), "unknown key");
}

#[test]
fn static_bundles_should_report_missing_language_as_fatal() {
    let bundles = StaticBundles::new().with_bundle("en", [("hello", "Hello")]);

    let err = bundles.load("fr").unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        Error::Localization(LocalizationError::MissingBundle { ref language }) if language == "fr"
    ));
}

#[test]
fn directory_loader_should_read_json_bundle() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("ar.json"),
        r#"{"hello": "مرحبا", "Done": "تم"}"#,
    )
    .unwrap();

    let bundle = DirectoryBundleLoader::new(dir.path()).load("ar").unwrap();

    assert_eq!(bundle.len(), 2);
    assert_eq!(bundle.get("Done"), Some("تم"));
}

#[test]
fn directory_loader_should_report_missing_file_as_missing_bundle() {
    let dir = tempdir().unwrap();

    let err = DirectoryBundleLoader::new(dir.path()).load("en").unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        Error::Localization(LocalizationError::MissingBundle { .. })
    ));
}

#[test]
fn directory_loader_should_reject_malformed_bundle() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("en.json"), r#"{"hello": 42}"#).unwrap();

    let err = DirectoryBundleLoader::new(dir.path()).load("en").unwrap_err();

    assert!(!err.is_fatal());
    assert!(matches!(
        err,
        Error::Localization(LocalizationError::InvalidBundle { .. })
    ));
}
