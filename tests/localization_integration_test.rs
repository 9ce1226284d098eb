mod common;

use std::sync::Arc;

use common::scripted_database;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use watchdb::constants;
use watchdb::DirectoryBundleLoader;
use watchdb::LocalizationConfig;
use watchdb::LocalizationManager;
use watchdb::MemoryLanguageStore;
use watchdb::Notification;
use watchdb::StaticBundles;

fn static_bundles() -> Arc<StaticBundles> {
    Arc::new(
        StaticBundles::new()
            .with_bundle("en", [("hello", "Hello"), ("Done", "Done")])
            .with_bundle("ar", [("hello", "مرحبا")]),
    )
}

#[test]
fn disappearing_languages_should_empty_list_and_notify_once() {
    let (remote, database) = scripted_database();
    let store = Arc::new(MemoryLanguageStore::new(vec!["en".into(), "ar".into()], None));
    let manager =
        LocalizationManager::new(database.clone(), LocalizationConfig::default(), store, static_bundles()).unwrap();
    assert_eq!(manager.supported_languages(), vec!["en", "ar"]);

    let mut rx = manager.subscribe();
    remote.emit(constants::SUPPORTED_LANGUAGES_LANGS, None);
    database.flush();

    assert_eq!(rx.try_recv(), Ok(Notification::SupportedLanguagesListChanged));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert!(manager.supported_languages().is_empty());
}

#[test]
fn string_table_should_be_swapped_and_missing_keys_reported() {
    let (remote, database) = scripted_database();
    let store = Arc::new(MemoryLanguageStore::new(vec!["en".into()], None));
    let manager =
        LocalizationManager::new(database.clone(), LocalizationConfig::default(), store, static_bundles()).unwrap();
    let mut rx = manager.subscribe();

    remote.emit(constants::LOCALIZATION, Some(json!({"en": {"hello": "Hi"}})));
    database.flush();

    assert_eq!(rx.try_recv(), Ok(Notification::LocalizationChanged));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(manager.localized_string("hello"), "Hi");

    assert_eq!(manager.localized_string("Done"), "Done");
    assert_eq!(
        remote.writes(),
        vec![("addLocalization/en/Done".to_string(), Some(json!("")))]
    );
}

#[test]
fn directory_bundles_should_back_lookups() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("en.json"), r#"{"Close": "Close"}"#).unwrap();
    std::fs::write(dir.path().join("ar.json"), r#"{"Close": "إغلاق"}"#).unwrap();

    let (_remote, database) = scripted_database();
    let config = LocalizationConfig {
        bundle_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let manager = LocalizationManager::new(
        database,
        config.clone(),
        Arc::new(MemoryLanguageStore::new(vec!["en".into(), "ar".into()], None)),
        Arc::new(DirectoryBundleLoader::new(&config.bundle_dir)),
    )
    .unwrap();

    assert_eq!(manager.localized_string("Close"), "Close");

    manager.set_current_language("ar").unwrap();
    assert_eq!(manager.localized_string("Close"), "إغلاق");

    assert!(manager.set_current_language("fr").unwrap_err().is_fatal());
    assert_eq!(manager.current_language(), "ar");
}
