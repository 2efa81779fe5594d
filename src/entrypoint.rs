use std::path::PathBuf;
use std::process;

use crate::app_context::AppContext;
use crate::config::Config;
use crate::constants::{CONFIG_FILE, GEOACL_VERSION};
use crate::http_proxy::run_http_proxy;
use crate::resolver::mmdb::spawn_periodic_reload;
use nullnet_liberror::{location, Error, ErrorHandler, Location};

#[tokio::main]
pub async fn start_geoacl() -> Result<(), Error> {
    init_logger();

    log::info!("Starting GeoACL server v{GEOACL_VERSION}");

    let config = Config::load_or_default(CONFIG_FILE);
    log::info!(
        "Loaded GeoACL configuration: {}",
        serde_json::to_string(&config.redacted()).unwrap_or_default()
    );

    // handle termination signals: SIGINT, SIGTERM, SIGHUP
    ctrlc::set_handler(move || terminate_geoacl(130)).handle_err(location!())?;

    if config.admin_token.is_none() {
        log::warn!("No admin token configured: peer updates and database reloads over HTTP are disabled");
    }

    let context = AppContext::new(config)?;
    let peers = context.peers.names().await;
    log::info!("Serving {} peers: {}", peers.len(), peers.join(", "));
    spawn_database_reload(&context);

    run_http_proxy(context).await
}

pub fn terminate_geoacl(exit_code: i32) {
    log::info!("Shutting down GeoACL server...");
    log::info!("Exiting with code {exit_code}");
    process::exit(exit_code);
}

fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::warn!("Logger already initialized");
    }
}

fn spawn_database_reload(context: &AppContext) {
    let Some(lookup) = context.geo_acl.resolver().provider().as_mmdb() else {
        return;
    };
    let (Some(path), Some(interval)) = (
        context.config.mmdb_path.as_ref(),
        context.config.mmdb_reload_interval(),
    ) else {
        return;
    };
    log::info!(
        "Watching geolocation database '{path}' every {} seconds",
        interval.as_secs()
    );
    spawn_periodic_reload(lookup.database().clone(), PathBuf::from(path), interval);
}
