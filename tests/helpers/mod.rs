use std::net::IpAddr;
use std::time::Duration;

use geoacl::{CountryCode, CountryLookup, CountryResolver, GeoAcl};
use nullnet_liberror::{location, Error, ErrorHandler, Location};

/// What the scripted provider answers for every address.
#[derive(Clone, Copy)]
pub enum Outcome {
    Country(&'static str),
    Unknown,
    Fails,
    Hangs,
}

pub struct ScriptedLookup {
    outcome: Outcome,
}

impl CountryLookup for ScriptedLookup {
    async fn lookup(&self, _ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        match self.outcome {
            Outcome::Country(code) => Ok(CountryCode::parse(code)),
            Outcome::Unknown => Ok(None),
            Outcome::Fails => Err("geolocation provider unavailable").handle_err(location!()),
            Outcome::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }
        }
    }
}

pub const LOOKUP_TIMEOUT: Duration = Duration::from_millis(50);

pub fn geo_acl(outcome: Outcome) -> GeoAcl<ScriptedLookup> {
    GeoAcl::new(CountryResolver::new(
        ScriptedLookup { outcome },
        LOOKUP_TIMEOUT,
        100,
    ))
}

pub fn public_ips() -> Vec<IpAddr> {
    ["5.9.0.1", "81.2.69.160", "2a00:1450:4001::1", "198.51.99.7"]
        .iter()
        .map(|ip| ip.parse().unwrap())
        .collect()
}
