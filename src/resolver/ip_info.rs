use std::net::IpAddr;

use nullnet_liberror::Error;
use nullnet_libipinfo::{ApiFields, IpInfoHandler, IpInfoProvider};

use crate::constants::API_KEY;
use crate::country::CountryCode;
use crate::helpers::get_env;
use crate::resolver::CountryLookup;

/// Country lookups through a remote IP information API.
pub struct IpInfoLookup {
    handler: IpInfoHandler,
}

impl IpInfoLookup {
    pub fn new() -> Result<Self, Error> {
        #[cfg(not(debug_assertions))]
        let url = "https://ipapi.co/{ip}/json/?key={api_key}";
        #[cfg(debug_assertions)]
        let url = "https://ipapi.co/{ip}/json";

        let handler = IpInfoHandler::new(vec![IpInfoProvider::new_api_provider(
            url,
            get_env(API_KEY, "IP info API key"),
            ApiFields {
                country: Some("/country"),
                asn: None,
                org: None,
                continent_code: None,
                city: None,
                region: None,
                postal: None,
                timezone: None,
            },
        )])?;

        Ok(Self { handler })
    }
}

impl CountryLookup for IpInfoLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        let info = self.handler.lookup(&ip.to_string()).await?;
        let country = info.country.as_deref().and_then(|c| {
            let code = CountryCode::parse(c);
            if code.is_none() {
                log::warn!("IP info API returned unexpected country '{c}' for {ip}");
            }
            code
        });
        Ok(country)
    }
}
