use std::sync::Arc;

use serde_json::json;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use watchdb::constants;
use watchdb::DatabaseBuilder;
use watchdb::DirectoryBundleLoader;
use watchdb::LocalizationManager;
use watchdb::MemoryDatabase;
use watchdb::MemoryLanguageStore;
use watchdb::Result;
use watchdb::WatchDbConfig;

fn main() -> Result<()> {
    init_observability();

    if let Err(e) = run() {
        error!("watchdb stops: {:?}", e);
        return Err(e);
    }

    Ok(())
}

fn run() -> Result<()> {
    let settings = WatchDbConfig::new()?.validate()?;

    let memory = MemoryDatabase::with_root(json!({
        "loc": {
            "en": { "Done": "Done", "Cancel": "Cancel" },
            "ar": { "Done": "تم", "Cancel": "إلغاء" },
        },
        "s_langs": {
            "langs": ["en", "ar"],
            "images": { "en": "gb", "ar": "sa" },
        },
    }));

    let database = Arc::new(
        DatabaseBuilder::new(settings.database.clone())
            .data_source(Arc::new(memory.clone()))
            .build()?,
    );

    let store = Arc::new(MemoryLanguageStore::new(
        settings.localization.initially_supported_languages.clone(),
        None,
    ));
    let bundles = Arc::new(DirectoryBundleLoader::new(&settings.localization.bundle_dir));

    let manager = LocalizationManager::new(database.clone(), settings.localization.clone(), store, bundles)?;
    database.flush();

    info!(
        language = %manager.current_language(),
        supported = ?manager.supported_languages(),
        "Localization ready"
    );

    for key in ["Done", "Cancel", "Not yet translated"] {
        println!("{key} => {}", manager.localized_string(key));
    }

    manager.set_current_language("ar")?;
    for key in ["Done", "Cancel"] {
        println!("{key} => {}", manager.localized_string(key));
    }
    println!(
        "flag: {:?}, right-to-left: {}",
        manager.flag_image_name("ar"),
        manager.is_current_language_right_to_left()
    );

    database.flush();
    println!(
        "missing keys reported: {}",
        memory.value_at(constants::MISSING_LOCALIZATION).unwrap_or_default()
    );

    Ok(())
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();
}
