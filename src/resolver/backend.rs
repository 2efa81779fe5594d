use std::net::IpAddr;

use nullnet_liberror::Error;

use crate::country::CountryCode;
use crate::resolver::ip_info::IpInfoLookup;
use crate::resolver::mmdb::MmdbLookup;
use crate::resolver::static_table::StaticLookup;
use crate::resolver::CountryLookup;

/// Lookup provider selected by configuration.
pub enum LookupBackend {
    Mmdb(MmdbLookup),
    IpInfoApi(IpInfoLookup),
    Static(StaticLookup),
}

impl LookupBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LookupBackend::Mmdb(_) => "mmdb",
            LookupBackend::IpInfoApi(_) => "ip_info_api",
            LookupBackend::Static(_) => "static",
        }
    }

    pub fn as_mmdb(&self) -> Option<&MmdbLookup> {
        match self {
            LookupBackend::Mmdb(lookup) => Some(lookup),
            _ => None,
        }
    }
}

impl CountryLookup for LookupBackend {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        match self {
            LookupBackend::Mmdb(lookup) => lookup.lookup(ip).await,
            LookupBackend::IpInfoApi(lookup) => lookup.lookup(ip).await,
            LookupBackend::Static(lookup) => lookup.lookup(ip).await,
        }
    }

    fn generation(&self) -> u64 {
        match self {
            LookupBackend::Mmdb(lookup) => lookup.generation(),
            LookupBackend::IpInfoApi(lookup) => lookup.generation(),
            LookupBackend::Static(lookup) => lookup.generation(),
        }
    }
}
