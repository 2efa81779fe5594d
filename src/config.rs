use std::collections::HashMap;
use std::time::Duration;

use nullnet_liberror::{location, Error, ErrorHandler, Location};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ADDR, DEFAULT_IP_INFO_CACHE_SIZE, DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MMDB_RELOAD_INTERVAL_SEC,
    DEFAULT_POLICY_CACHE_SIZE, MMDB_FILE, PORT,
};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupBackendKind {
    #[default]
    Mmdb,
    IpInfoApi,
    Static,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lookup_backend: LookupBackendKind,
    pub mmdb_path: Option<String>,
    pub mmdb_reload_interval_sec: u64,
    pub lookup_timeout_ms: u64,
    pub ip_info_cache_size: usize,
    pub policy_cache_size: usize,
    pub http_addr: String,
    /// Bearer token required by the admin endpoints that change state.
    /// Those endpoints are refused when it's not set.
    pub admin_token: Option<String>,
    /// Allowed-countries string of each peer, by peer name.
    pub peers: HashMap<String, String>,
    /// Country code of each address, used by the static lookup backend.
    pub static_countries: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookup_backend: LookupBackendKind::default(),
            mmdb_path: Some(MMDB_FILE.to_string()),
            mmdb_reload_interval_sec: DEFAULT_MMDB_RELOAD_INTERVAL_SEC,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            ip_info_cache_size: DEFAULT_IP_INFO_CACHE_SIZE,
            policy_cache_size: DEFAULT_POLICY_CACHE_SIZE,
            http_addr: format!("{ADDR}:{PORT}"),
            admin_token: None,
            peers: HashMap::new(),
            static_countries: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).handle_err(location!())?;
        serde_json::from_str(&content).handle_err(location!())
    }

    /// Loads the configuration file, falling back to defaults when it can't be read.
    pub fn load_or_default(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(_) => {
                log::warn!("Unable to load configuration from '{path}': using defaults");
                Self::default()
            }
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn mmdb_reload_interval(&self) -> Option<Duration> {
        (self.mmdb_reload_interval_sec > 0)
            .then(|| Duration::from_secs(self.mmdb_reload_interval_sec))
    }

    /// Copy of the configuration that can be written to the logs.
    pub fn redacted(&self) -> Self {
        Self {
            admin_token: self.admin_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
