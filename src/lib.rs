pub mod app_context;
pub mod config;
pub mod constants;
pub mod country;
pub mod decision;
pub mod entrypoint;
pub mod geo_acl;
pub mod helpers;
mod http_proxy;
pub mod peers;
pub mod policy;
pub mod resolver;

pub use country::{CountryCode, Resolution};
pub use decision::{decide, Reason, Sense, Verdict};
pub use geo_acl::GeoAcl;
pub use policy::{CountryPolicy, PolicyMode, PolicyWarning};
pub use resolver::{CountryLookup, CountryResolver};
