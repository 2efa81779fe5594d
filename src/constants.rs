// project-level constants
pub const GEOACL_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const API_KEY: Option<&str> = option_env!("API_KEY");

// -------------------------------------------------------------------------------------------------

// server constants
pub const ADDR: &str = "127.0.0.1";

pub const PORT: u16 = 8090;

// -------------------------------------------------------------------------------------------------

// config constants
#[cfg(not(debug_assertions))]
pub const CONFIG_FILE: &str = "/opt/config/config.json";
#[cfg(debug_assertions)]
pub const CONFIG_FILE: &str = "./test_material/config/config.json";

// -------------------------------------------------------------------------------------------------

// geolocation constants
#[cfg(not(debug_assertions))]
pub const MMDB_FILE: &str = "/opt/geoip/GeoLite2-Country.mmdb";
#[cfg(debug_assertions)]
pub const MMDB_FILE: &str = "./test_material/geoip/geoacl-country-test.mmdb";

pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 500;

pub const DEFAULT_IP_INFO_CACHE_SIZE: usize = 1000;

pub const DEFAULT_POLICY_CACHE_SIZE: usize = 256;

pub const DEFAULT_MMDB_RELOAD_INTERVAL_SEC: u64 = 60 * 60;

// -------------------------------------------------------------------------------------------------

// policy grammar constants
pub const NEGATION_MARKER: char = '!';
pub const WILDCARD_TOKEN: &str = "all";

// -------------------------------------------------------------------------------------------------

// logging constants
pub const AUDIT_TARGET: &str = "geoacl::audit";
