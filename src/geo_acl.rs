use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use nullnet_liberror::Error;

use crate::constants::{AUDIT_TARGET, DEFAULT_POLICY_CACHE_SIZE};
use crate::country::Resolution;
use crate::decision::{decide, Reason, Sense, Verdict};
use crate::policy::{CountryPolicy, PolicyMode};
use crate::resolver::{CountryLookup, CountryResolver};

/// Entry point of the geographic access control: decides whether a peer connecting
/// from a given address is allowed by its allowed-countries policy.
///
/// Safe to share between connection handlers. Parsed policies are cached per distinct
/// policy string, keeping only the most recently parsed ones.
pub struct GeoAcl<L> {
    resolver: CountryResolver<L>,
    policy_cache_size: usize,
    policies: RwLock<IndexMap<String, Arc<CountryPolicy>>>,
}

impl<L: CountryLookup> GeoAcl<L> {
    pub fn new(resolver: CountryResolver<L>) -> Self {
        Self::with_policy_cache_size(resolver, DEFAULT_POLICY_CACHE_SIZE)
    }

    pub fn with_policy_cache_size(resolver: CountryResolver<L>, policy_cache_size: usize) -> Self {
        Self {
            resolver,
            policy_cache_size,
            policies: RwLock::new(IndexMap::new()),
        }
    }

    pub fn resolver(&self) -> &CountryResolver<L> {
        &self.resolver
    }

    /// Returns `true` if the peer is allowed to communicate from `ip`.
    ///
    /// The reason of the verdict is only reported through the audit log.
    /// An address that can't be a connection source is denied.
    pub async fn check(&self, ip: IpAddr, allowed_countries: &str, peer: &str) -> bool {
        match self.evaluate(ip, allowed_countries, peer).await {
            Ok(verdict) => verdict.allowed,
            Err(err) => {
                log::error!("Geo ACL check for peer '{peer}' failed: {}", err.to_str());
                audit(peer, ip, None, Verdict::deny(Reason::InvalidAddress));
                false
            }
        }
    }

    /// Same as [`GeoAcl::check`], with the historical integer convention.
    pub async fn check_sense(&self, ip: IpAddr, allowed_countries: &str, peer: &str) -> Sense {
        Sense::from(self.check(ip, allowed_countries, peer).await)
    }

    /// Runs the geographic check after the host-based ACL has been evaluated by the caller.
    /// A host ACL denial is final and skips geolocation altogether.
    pub async fn check_after_host_acl(
        &self,
        host_acl: Sense,
        ip: IpAddr,
        allowed_countries: &str,
        peer: &str,
    ) -> bool {
        if host_acl == Sense::Deny {
            audit(peer, ip, None, Verdict::deny(Reason::HostAclDenied));
            return false;
        }
        self.check(ip, allowed_countries, peer).await
    }

    /// Full verdict for a peer connecting from `ip`.
    ///
    /// Fails only on addresses that can't be a connection source; resolution problems
    /// are part of the verdict.
    pub async fn evaluate(
        &self,
        ip: IpAddr,
        allowed_countries: &str,
        peer: &str,
    ) -> Result<Verdict, Error> {
        let policy = self.policy(allowed_countries);
        self.evaluate_policy(ip, &policy, peer).await
    }

    /// Full verdict against an already parsed policy, bypassing the policy cache.
    pub async fn evaluate_policy(
        &self,
        ip: IpAddr,
        policy: &CountryPolicy,
        peer: &str,
    ) -> Result<Verdict, Error> {
        // wildcard policies don't depend on the origin: skip the lookup entirely
        let resolution = match policy.mode() {
            PolicyMode::AllowAll | PolicyMode::DenyAll => None,
            PolicyMode::AllowListed | PolicyMode::DenyListed => {
                Some(self.resolver.resolve(ip).await?)
            }
        };

        let verdict = decide(resolution.unwrap_or(Resolution::Unknown), policy, peer);
        audit(peer, ip, resolution, verdict);
        Ok(verdict)
    }

    /// Parsed policy for `raw`, from the cache when already seen.
    pub fn policy(&self, raw: &str) -> Arc<CountryPolicy> {
        if let Ok(policies) = self.policies.read() {
            if let Some(policy) = policies.get(raw) {
                return policy.clone();
            }
        }

        let policy = Arc::new(CountryPolicy::parse(raw));
        if self.policy_cache_size == 0 {
            return policy;
        }
        let Ok(mut policies) = self.policies.write() else {
            return policy;
        };
        if let Some(cached) = policies.get(raw) {
            return cached.clone();
        }
        policies.shift_insert(0, raw.to_string(), policy.clone());
        while policies.len() > self.policy_cache_size {
            policies.pop();
        }
        policy
    }

    pub fn cached_policies(&self) -> usize {
        self.policies.read().map(|p| p.len()).unwrap_or_default()
    }
}

fn audit(peer: &str, ip: IpAddr, resolution: Option<Resolution>, verdict: Verdict) {
    let origin = resolution.map_or_else(|| "not resolved".to_string(), |r| r.to_string());
    log::info!(
        target: AUDIT_TARGET,
        "***{:?}*** peer '{peer}' from {ip} ({origin}): {}",
        verdict.sense(),
        verdict.reason
    );
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::resolver::static_table::StaticLookup;

    fn geo_acl() -> GeoAcl<StaticLookup> {
        let lookup = StaticLookup::from_entries([("5.9.0.1", "DE"), ("5.8.0.1", "RU")]);
        GeoAcl::new(CountryResolver::new(lookup, Duration::from_millis(100), 16))
    }

    #[tokio::test]
    async fn test_check_allow_and_deny_lists() {
        let acl = geo_acl();
        let de = "5.9.0.1".parse().unwrap();
        let ru = "5.8.0.1".parse().unwrap();
        assert!(acl.check(de, "DE,FR", "peer").await);
        assert!(!acl.check(ru, "DE,FR", "peer").await);
        assert!(!acl.check(ru, "!RU", "peer").await);
        assert!(acl.check(de, "!RU", "peer").await);
    }

    #[tokio::test]
    async fn test_check_invalid_address_denies() {
        let acl = geo_acl();
        let ip = "0.0.0.0".parse().unwrap();
        assert!(acl.evaluate(ip, "DE", "peer").await.is_err());
        assert!(!acl.check(ip, "DE", "peer").await);
        assert_eq!(acl.check_sense(ip, "DE", "peer").await, Sense::Deny);
    }

    #[tokio::test]
    async fn test_wildcard_policies_skip_resolution() {
        let acl = geo_acl();
        let ip = "5.9.0.1".parse().unwrap();
        assert_eq!(
            acl.evaluate(ip, "", "peer").await.unwrap(),
            Verdict::allow(Reason::PolicyAllowsAll)
        );
        assert_eq!(
            acl.evaluate(ip, "!all", "peer").await.unwrap(),
            Verdict::deny(Reason::PolicyDeniesAll)
        );
        assert_eq!(acl.resolver().cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_host_acl_deny_is_final() {
        let acl = geo_acl();
        let de = "5.9.0.1".parse().unwrap();
        assert!(!acl.check_after_host_acl(Sense::Deny, de, "", "peer").await);
        assert!(acl.check_after_host_acl(Sense::Allow, de, "DE", "peer").await);
        assert!(!acl.check_after_host_acl(Sense::Allow, de, "!DE", "peer").await);
        assert_eq!(acl.resolver().cached_entries(), 1);
    }

    #[test]
    fn test_policy_cache() {
        let acl = geo_acl();
        let first = acl.policy("DE,FR");
        let second = acl.policy("DE,FR");
        assert!(Arc::ptr_eq(&first, &second));
        acl.policy("!RU");
        assert_eq!(acl.cached_policies(), 2);
    }

    #[tokio::test]
    async fn test_policy_cache_is_bounded() {
        let lookup = StaticLookup::from_entries([("5.9.0.1", "DE")]);
        let acl = GeoAcl::with_policy_cache_size(
            CountryResolver::new(lookup, Duration::from_millis(100), 16),
            8,
        );
        let de = "5.9.0.1".parse().unwrap();
        for i in 0..500 {
            assert!(acl.check(de, &format!("DE,x{i}"), "peer").await);
        }
        assert_eq!(acl.cached_policies(), 8);

        // the most recent policies are kept
        let recent = acl.policy("DE,x499");
        assert!(Arc::ptr_eq(&recent, &acl.policy("DE,x499")));
        assert_eq!(acl.cached_policies(), 8);
    }

    #[tokio::test]
    async fn test_disabled_policy_cache() {
        let lookup = StaticLookup::from_entries([("5.8.0.1", "RU")]);
        let acl = GeoAcl::with_policy_cache_size(
            CountryResolver::new(lookup, Duration::from_millis(100), 16),
            0,
        );
        let ru = "5.8.0.1".parse().unwrap();
        assert!(!acl.check(ru, "!RU", "peer").await);
        assert!(acl.check(ru, "RU", "peer").await);
        assert_eq!(acl.cached_policies(), 0);
    }

    #[tokio::test]
    async fn test_evaluate_policy_bypasses_cache() {
        let acl = geo_acl();
        let ru = "5.8.0.1".parse().unwrap();
        let policy = CountryPolicy::parse("!RU,!CN");
        assert_eq!(
            acl.evaluate_policy(ru, &policy, "peer").await.unwrap(),
            Verdict::deny(Reason::InDenyList)
        );
        assert_eq!(acl.cached_policies(), 0);
    }
}
