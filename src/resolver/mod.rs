use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::RwLock;
use std::time::Duration;

use indexmap::IndexMap;
use nullnet_liberror::{location, Error, ErrorHandler, Location};

use crate::country::{CountryCode, Resolution};

mod backend;
pub mod ip_info;
pub mod mmdb;
pub mod static_table;

pub use backend::LookupBackend;

/// External source mapping addresses to countries.
pub trait CountryLookup: Send + Sync {
    /// Returns the country of `ip`, or `None` when the source has no mapping for it.
    fn lookup(
        &self,
        ip: IpAddr,
    ) -> impl Future<Output = Result<Option<CountryCode>, Error>> + Send;

    /// Version of the data behind the lookups; a change invalidates cached resolutions.
    fn generation(&self) -> u64 {
        0
    }
}

struct ResolutionCache {
    generation: u64,
    entries: IndexMap<IpAddr, Resolution>,
}

/// Resolves source addresses to their country of origin, with a bounded cache
/// in front of the lookup provider.
pub struct CountryResolver<L> {
    provider: L,
    timeout: Duration,
    cache_size: usize,
    cache: RwLock<ResolutionCache>,
}

impl<L: CountryLookup> CountryResolver<L> {
    pub fn new(provider: L, timeout: Duration, cache_size: usize) -> Self {
        Self {
            provider,
            timeout,
            cache_size,
            cache: RwLock::new(ResolutionCache {
                generation: 0,
                entries: IndexMap::new(),
            }),
        }
    }

    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Resolves `ip` to a country.
    ///
    /// Fails only if `ip` can't be the source of a connection (unspecified, broadcast or
    /// multicast). Provider errors and timeouts come back as `Resolution::LookupFailed`.
    pub async fn resolve(&self, ip: IpAddr) -> Result<Resolution, Error> {
        let ip = ip.to_canonical();
        validate_source_ip(ip)?;

        if is_non_public(ip) {
            log::debug!("{ip} is not publicly routable: country unknown");
            return Ok(Resolution::Unknown);
        }

        let generation = self.provider.generation();
        if let Some(resolution) = self.cached(ip, generation) {
            log::debug!("Country of {ip} already in cache: {resolution}");
            return Ok(resolution);
        }

        let resolution = match tokio::time::timeout(self.timeout, self.provider.lookup(ip)).await
        {
            Ok(Ok(Some(code))) => Resolution::Country(code),
            Ok(Ok(None)) => Resolution::Unknown,
            Ok(Err(err)) => {
                log::warn!("Country lookup for {ip} failed: {}", err.to_str());
                Resolution::LookupFailed
            }
            Err(_) => {
                log::warn!(
                    "Country lookup for {ip} timed out after {} ms",
                    self.timeout.as_millis()
                );
                Resolution::LookupFailed
            }
        };

        if resolution != Resolution::LookupFailed {
            self.refresh_cache(ip, resolution, generation);
        }

        Ok(resolution)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.read().map(|c| c.entries.len()).unwrap_or_default()
    }

    fn cached(&self, ip: IpAddr, generation: u64) -> Option<Resolution> {
        let cache = self.cache.read().ok()?;
        if cache.generation != generation {
            return None;
        }
        cache.entries.get(&ip).copied()
    }

    fn refresh_cache(&self, ip: IpAddr, resolution: Resolution, generation: u64) {
        if self.cache_size == 0 {
            return;
        }
        let Ok(mut cache) = self.cache.write() else {
            log::warn!("Resolution cache is poisoned (not caching {ip})");
            return;
        };
        if generation < cache.generation {
            // resolved against data that has been replaced in the meantime
            return;
        }
        if generation > cache.generation {
            log::info!("Geolocation data changed to generation {generation}: clearing cache");
            cache.entries.clear();
            cache.generation = generation;
        }
        cache.entries.shift_insert(0, ip, resolution);
        while cache.entries.len() > self.cache_size {
            cache.entries.pop();
        }
    }
}

fn validate_source_ip(ip: IpAddr) -> Result<(), Error> {
    let invalid = match ip {
        IpAddr::V4(v4) => v4.is_unspecified() || v4.is_broadcast() || v4.is_multicast(),
        IpAddr::V6(v6) => v6.is_unspecified() || v6.is_multicast(),
    };
    if invalid {
        return Err(format!("Invalid source address {ip}")).handle_err(location!());
    }
    Ok(())
}

fn is_non_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_non_public_v4(v4),
        IpAddr::V6(v6) => is_non_public_v6(v6),
    }
}

fn is_non_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_documentation()
        // shared address space (RFC 6598)
        || (a == 100 && (b & 0b1100_0000) == 64)
        // reserved for future use (RFC 1112)
        || a >= 240
}

fn is_non_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        // unique local
        || (first & 0xfe00) == 0xfc00
        // link local
        || (first & 0xffc0) == 0xfe80
        // documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}
