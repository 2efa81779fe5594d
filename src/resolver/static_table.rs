use std::collections::HashMap;
use std::net::IpAddr;

use nullnet_liberror::Error;

use crate::country::CountryCode;
use crate::resolver::CountryLookup;

/// Fixed address-to-country table, for deployments without a geolocation database.
#[derive(Debug, Default, Clone)]
pub struct StaticLookup {
    table: HashMap<IpAddr, CountryCode>,
}

impl StaticLookup {
    /// Builds the table from `(address, code)` string pairs,
    /// skipping (and logging) entries that don't parse.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut table = HashMap::new();
        for (ip_str, code_str) in entries {
            let (Ok(ip), Some(code)) = (ip_str.parse::<IpAddr>(), CountryCode::parse(code_str))
            else {
                log::warn!("Skipping invalid static country entry '{ip_str}' => '{code_str}'");
                continue;
            };
            table.insert(ip.to_canonical(), code);
        }
        Self { table }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl CountryLookup for StaticLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        Ok(self.table.get(&ip).copied())
    }
}
