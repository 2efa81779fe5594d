use std::path::Path;
use std::sync::Arc;

use nullnet_liberror::Error;

use crate::config::{Config, LookupBackendKind};
use crate::geo_acl::GeoAcl;
use crate::peers::PeerTable;
use crate::resolver::ip_info::IpInfoLookup;
use crate::resolver::mmdb::{init_global_database, MmdbLookup};
use crate::resolver::static_table::StaticLookup;
use crate::resolver::{CountryResolver, LookupBackend};

#[derive(Clone)]
pub struct AppContext {
    pub geo_acl: Arc<GeoAcl<LookupBackend>>,
    pub peers: Arc<PeerTable>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self, Error> {
        let backend = lookup_backend(&config)?;
        log::info!("Country lookups through the '{}' backend", backend.name());

        let resolver = CountryResolver::new(
            backend,
            config.lookup_timeout(),
            config.ip_info_cache_size,
        );

        Ok(Self {
            geo_acl: Arc::new(GeoAcl::with_policy_cache_size(
                resolver,
                config.policy_cache_size,
            )),
            peers: Arc::new(PeerTable::new(config.peers.clone())),
            config: Arc::new(config),
        })
    }
}

fn lookup_backend(config: &Config) -> Result<LookupBackend, Error> {
    let backend = match config.lookup_backend {
        LookupBackendKind::Mmdb => {
            let db = init_global_database();
            match &config.mmdb_path {
                Some(path) => {
                    if db.reload_from_file(Path::new(path)).is_err() {
                        log::warn!(
                            "Geolocation database unavailable: listed policies will deny until it is loaded"
                        );
                    }
                }
                None => log::warn!("No geolocation database path configured"),
            }
            LookupBackend::Mmdb(MmdbLookup::new(db))
        }
        LookupBackendKind::IpInfoApi => LookupBackend::IpInfoApi(IpInfoLookup::new()?),
        LookupBackendKind::Static => {
            let lookup = StaticLookup::from_entries(
                config
                    .static_countries
                    .iter()
                    .map(|(ip, code)| (ip.as_str(), code.as_str())),
            );
            log::info!("Loaded {} static country entries", lookup.len());
            LookupBackend::Static(lookup)
        }
    };
    Ok(backend)
}
