use std::fmt;

use serde::Serialize;

use crate::country::Resolution;
use crate::policy::{CountryPolicy, PolicyMode};

/// Historical allow/deny integer convention of the signaling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Sense {
    Deny = 0,
    Allow = 1,
}

impl From<bool> for Sense {
    fn from(allowed: bool) -> Self {
        if allowed {
            Sense::Allow
        } else {
            Sense::Deny
        }
    }
}

impl From<Sense> for i32 {
    fn from(sense: Sense) -> Self {
        sense as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    PolicyAllowsAll,
    PolicyDeniesAll,
    ResolutionFailed,
    CountryUnknown,
    InAllowList,
    NotInAllowList,
    InDenyList,
    NotInDenyList,
    /// The caller handed over an address that can't belong to a peer.
    InvalidAddress,
    /// The host-based ACL already denied the address.
    HostAclDenied,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::PolicyAllowsAll => "policy allows all countries",
            Reason::PolicyDeniesAll => "policy denies all countries",
            Reason::ResolutionFailed => "country resolution failed",
            Reason::CountryUnknown => "country unknown",
            Reason::InAllowList => "country in allow list",
            Reason::NotInAllowList => "country not in allow list",
            Reason::InDenyList => "country in deny list",
            Reason::NotInDenyList => "country not in deny list",
            Reason::InvalidAddress => "invalid source address",
            Reason::HostAclDenied => "denied by host ACL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: Reason,
}

impl Verdict {
    pub fn allow(reason: Reason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn deny(reason: Reason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn sense(&self) -> Sense {
        Sense::from(self.allowed)
    }
}

/// Combines the resolved origin of a peer with its policy.
///
/// Wildcard policies are decided before the resolution is looked at, so a failed lookup
/// only matters for listed policies, where it always denies.
/// An unknown country is only allowed by a deny list, since it can't be one of its targets.
///
/// `peer` is used for attribution only.
pub fn decide(resolution: Resolution, policy: &CountryPolicy, peer: &str) -> Verdict {
    let verdict = match (policy.mode(), resolution) {
        (PolicyMode::AllowAll, _) => Verdict::allow(Reason::PolicyAllowsAll),
        (PolicyMode::DenyAll, _) => Verdict::deny(Reason::PolicyDeniesAll),
        (_, Resolution::LookupFailed) => Verdict::deny(Reason::ResolutionFailed),
        (PolicyMode::DenyListed, Resolution::Unknown) => Verdict::allow(Reason::NotInDenyList),
        (PolicyMode::AllowListed, Resolution::Unknown) => Verdict::deny(Reason::CountryUnknown),
        (PolicyMode::AllowListed, Resolution::Country(code)) => {
            if policy.contains(&code) {
                Verdict::allow(Reason::InAllowList)
            } else {
                Verdict::deny(Reason::NotInAllowList)
            }
        }
        (PolicyMode::DenyListed, Resolution::Country(code)) => {
            if policy.contains(&code) {
                Verdict::deny(Reason::InDenyList)
            } else {
                Verdict::allow(Reason::NotInDenyList)
            }
        }
    };
    log::debug!("Peer '{peer}' from {resolution} with policy '{policy}': {verdict:?}");
    verdict
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::country::CountryCode;

    fn country(code: &str) -> Resolution {
        Resolution::Country(CountryCode::parse(code).unwrap())
    }

    fn all_resolutions() -> Vec<Resolution> {
        vec![
            country("DE"),
            country("RU"),
            Resolution::Unknown,
            Resolution::LookupFailed,
        ]
    }

    #[test]
    fn test_decide_allow_all_overrides_resolution() {
        let policy = CountryPolicy::parse("all");
        for resolution in all_resolutions() {
            assert_eq!(
                decide(resolution, &policy, "peer"),
                Verdict::allow(Reason::PolicyAllowsAll)
            );
        }
    }

    #[test]
    fn test_decide_deny_all_overrides_resolution() {
        let policy = CountryPolicy::parse("!all");
        for resolution in all_resolutions() {
            assert_eq!(
                decide(resolution, &policy, "peer"),
                Verdict::deny(Reason::PolicyDeniesAll)
            );
        }
    }

    #[test]
    fn test_decide_allow_list() {
        let policy = CountryPolicy::parse("DE,FR");
        assert_eq!(
            decide(country("DE"), &policy, "peer"),
            Verdict::allow(Reason::InAllowList)
        );
        assert_eq!(
            decide(country("RU"), &policy, "peer"),
            Verdict::deny(Reason::NotInAllowList)
        );
        assert_eq!(
            decide(Resolution::Unknown, &policy, "peer"),
            Verdict::deny(Reason::CountryUnknown)
        );
        assert_eq!(
            decide(Resolution::LookupFailed, &policy, "peer"),
            Verdict::deny(Reason::ResolutionFailed)
        );
    }

    #[test]
    fn test_decide_deny_list() {
        let policy = CountryPolicy::parse("!RU");
        assert_eq!(
            decide(country("RU"), &policy, "peer"),
            Verdict::deny(Reason::InDenyList)
        );
        assert_eq!(
            decide(country("DE"), &policy, "peer"),
            Verdict::allow(Reason::NotInDenyList)
        );
        assert_eq!(
            decide(Resolution::Unknown, &policy, "peer"),
            Verdict::allow(Reason::NotInDenyList)
        );
        assert_eq!(
            decide(Resolution::LookupFailed, &policy, "peer"),
            Verdict::deny(Reason::ResolutionFailed)
        );
    }

    #[test]
    fn test_decide_is_idempotent() {
        for raw in ["", "!all", "DE,FR", "!RU"] {
            let policy = CountryPolicy::parse(raw);
            for resolution in all_resolutions() {
                assert_eq!(
                    decide(resolution, &policy, "a"),
                    decide(resolution, &policy, "b")
                );
            }
        }
    }

    #[test]
    fn test_sense_integer_convention() {
        assert_eq!(i32::from(Sense::Allow), 1);
        assert_eq!(i32::from(Sense::Deny), 0);
        assert_eq!(Verdict::allow(Reason::InAllowList).sense(), Sense::Allow);
        assert_eq!(Verdict::deny(Reason::InDenyList).sense(), Sense::Deny);
    }
}
