use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_watchdb_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("WATCHDB__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = WatchDbConfig::default();

    assert_eq!(config.database.delivery_queue_size, 1024);
    assert!(config.database.keep_synced);
    assert!(!config.database.persistence_enabled);
    assert_eq!(config.localization.string_table_path, "loc");
    assert_eq!(config.localization.languages_path, "s_langs/langs");
    assert_eq!(config.localization.icons_path, "s_langs/images");
    assert_eq!(config.localization.missing_localization_path, "addLocalization");
    assert_eq!(config.localization.default_language, "en");
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_watchdb_env_vars();
    with_vars(
        vec![
            ("WATCHDB__DATABASE__DELIVERY_QUEUE_SIZE", Some("64")),
            ("WATCHDB__DATABASE__KEEP_SYNCED", Some("false")),
        ],
        || {
            let config = WatchDbConfig::new().unwrap();

            assert_eq!(config.database.delivery_queue_size, 64);
            assert!(!config.database.keep_synced);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_watchdb_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    std::fs::write(
        &config_path,
        r#"
        [database]
        persistence_enabled = true

        [localization]
        default_language = "ar"
        preferred_languages = ["ar", "en"]
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = WatchDbConfig::new().expect("success");
        let config = base_config
            .with_override_config(config_path.to_str().unwrap())
            .unwrap();

        assert!(config.database.persistence_enabled);
        assert_eq!(config.database.delivery_queue_size, 1024);
        assert_eq!(config.localization.default_language, "ar");
        assert_eq!(config.localization.preferred_languages, vec!["ar", "en"]);
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_watchdb_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [database]
        delivery_queue_size = 10
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("WATCHDB__DATABASE__DELIVERY_QUEUE_SIZE", Some("20")),
        ],
        || {
            let config = WatchDbConfig::new().unwrap();
            assert_eq!(config.database.delivery_queue_size, 20);
        },
    );
}

#[test]
fn validation_should_reject_oversized_delivery_queue() {
    let mut config = WatchDbConfig::default();
    config.database.delivery_queue_size = 2_000_000;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_accept_unbounded_delivery_queue() {
    let mut config = WatchDbConfig::default();
    config.database.delivery_queue_size = 0;

    assert!(config.validate().is_ok());
}

#[test]
fn validation_should_reject_colliding_localization_paths() {
    let mut config = WatchDbConfig::default();
    config.localization.icons_path = config.localization.string_table_path.clone();

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_empty_default_language() {
    let mut config = WatchDbConfig::default();
    config.localization.default_language = "  ".into();

    assert!(config.validate().is_err());
}

#[test]
fn observed_paths_should_list_the_three_localization_paths() {
    let config = LocalizationConfig::default();

    assert_eq!(
        config.observed_paths(),
        vec!["loc", "s_langs/images", "s_langs/langs"]
    );
}
