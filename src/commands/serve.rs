//! Serve and init-db command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use geolog::config::GeologConfig;
use geolog::services::RecordService;
use geolog::storage::RecordStoreFactory;

/// Opens the store, ensures the schema and serves HTTP until shutdown.
pub async fn cmd_serve(
    config: GeologConfig,
    port: Option<u16>,
    database: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(database) = database {
        config = config.with_database_path(database);
    }

    let store = RecordStoreFactory::open(&config.database)?;
    let service = Arc::new(RecordService::new(store).with_policy(config.validation));

    geolog::http::run(&config, service).await?;
    Ok(())
}

/// Creates the database file and the `log` table, then exits.
pub fn cmd_init_db(
    config: &GeologConfig,
    database: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match database {
        Some(path) => config.clone().with_database_path(path).database,
        None => config.database.clone(),
    };

    let store = RecordStoreFactory::open(&settings)?;
    let count = store.count()?;
    println!(
        "Database ready: {} ({count} record(s))",
        settings.path.display()
    );
    Ok(())
}
