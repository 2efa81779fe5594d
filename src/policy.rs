use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::constants::{NEGATION_MARKER, WILDCARD_TOKEN};
use crate::country::CountryCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    AllowAll,
    DenyAll,
    /// Allow only the listed countries.
    AllowListed,
    /// Deny the listed countries, allow the rest.
    DenyListed,
}

/// Normalized allowed-countries policy of a peer.
///
/// `codes` is empty if and only if the mode is `AllowAll` or `DenyAll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryPolicy {
    mode: PolicyMode,
    codes: BTreeSet<CountryCode>,
}

/// Problems found while parsing a policy string.
/// None of them makes the parse fail: they are resolved deterministically and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyWarning {
    /// Token that is neither the wildcard nor a two-letter code.
    MalformedToken(String),
    /// Positive and negated codes in the same string; the positive ones were discarded.
    MixedPolarity(Vec<CountryCode>),
    /// Tokens made redundant by a stronger one (e.g. codes next to `!all`).
    IgnoredTokens(Vec<String>),
    /// Non-empty string without any usable token.
    NoValidTokens,
}

impl fmt::Display for PolicyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyWarning::MalformedToken(t) => write!(f, "discarded malformed token '{t}'"),
            PolicyWarning::MixedPolarity(codes) => {
                let codes: Vec<&str> = codes.iter().map(CountryCode::as_str).collect();
                write!(
                    f,
                    "mixed allowed and negated countries; negated entries take precedence, ignoring {}",
                    codes.join(",")
                )
            }
            PolicyWarning::IgnoredTokens(tokens) => {
                write!(f, "ignoring redundant tokens {}", tokens.join(","))
            }
            PolicyWarning::NoValidTokens => {
                write!(
                    f,
                    "no valid token found (expected two-letter country codes, optionally \
                     prefixed by '{NEGATION_MARKER}', or '{WILDCARD_TOKEN}', separated by \
                     commas or whitespace); denying all countries"
                )
            }
        }
    }
}

impl CountryPolicy {
    pub fn allow_all() -> Self {
        Self {
            mode: PolicyMode::AllowAll,
            codes: BTreeSet::new(),
        }
    }

    pub fn deny_all() -> Self {
        Self {
            mode: PolicyMode::DenyAll,
            codes: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Listed codes in ascending order.
    pub fn codes(&self) -> impl ExactSizeIterator<Item = &CountryCode> + '_ {
        self.codes.iter()
    }

    pub fn contains(&self, code: &CountryCode) -> bool {
        self.codes.contains(code)
    }

    /// Parses an allowed-countries string, logging every warning found on the way.
    pub fn parse(raw: &str) -> Self {
        let (policy, warnings) = Self::parse_with_warnings(raw);
        for warning in &warnings {
            log::warn!("Allowed countries '{raw}': {warning}");
        }
        policy
    }

    /// Parses an allowed-countries string.
    ///
    /// Tokens are separated by commas and/or whitespace and are case-insensitive:
    /// - empty string or `all`: allow every country
    /// - `!all`: deny every country
    /// - `DE,FR`: allow only the listed countries
    /// - `!RU,!CN`: deny the listed countries, allow the rest
    ///
    /// When positive and negated codes are mixed, the negated ones win and the positive
    /// ones are dropped. A non-empty string with no usable token denies every country.
    pub fn parse_with_warnings(raw: &str) -> (Self, Vec<PolicyWarning>) {
        let mut warnings = Vec::new();
        let mut allowed = BTreeSet::new();
        let mut denied = BTreeSet::new();
        let mut allow_wildcard = false;
        let mut deny_wildcard = false;
        let mut tokens = Vec::new();

        for token in raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            tokens.push(token);
            let (negated, body) = match token.strip_prefix(NEGATION_MARKER) {
                Some(body) => (true, body),
                None => (false, token),
            };
            if body.eq_ignore_ascii_case(WILDCARD_TOKEN) {
                if negated {
                    deny_wildcard = true;
                } else {
                    allow_wildcard = true;
                }
            } else if let Some(code) = CountryCode::parse(body) {
                if negated {
                    denied.insert(code);
                } else {
                    allowed.insert(code);
                }
            } else {
                warnings.push(PolicyWarning::MalformedToken(token.to_string()));
            }
        }

        if tokens.is_empty() {
            return (Self::allow_all(), warnings);
        }

        if deny_wildcard {
            let ignored: Vec<String> = tokens
                .iter()
                .filter(|t| !is_deny_wildcard(t))
                .map(ToString::to_string)
                .collect();
            if !ignored.is_empty() {
                warnings.push(PolicyWarning::IgnoredTokens(ignored));
            }
            return (Self::deny_all(), warnings);
        }

        if !denied.is_empty() {
            if !allowed.is_empty() {
                warnings.push(PolicyWarning::MixedPolarity(allowed.into_iter().collect()));
            }
            let policy = Self {
                mode: PolicyMode::DenyListed,
                codes: denied,
            };
            return (policy, warnings);
        }

        if !allowed.is_empty() {
            if allow_wildcard {
                warnings.push(PolicyWarning::IgnoredTokens(vec![WILDCARD_TOKEN.to_string()]));
            }
            let policy = Self {
                mode: PolicyMode::AllowListed,
                codes: allowed,
            };
            return (policy, warnings);
        }

        if allow_wildcard {
            return (Self::allow_all(), warnings);
        }

        warnings.push(PolicyWarning::NoValidTokens);
        (Self::deny_all(), warnings)
    }
}

impl fmt::Display for CountryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.mode {
            PolicyMode::AllowAll => return f.write_str(WILDCARD_TOKEN),
            PolicyMode::DenyAll => return write!(f, "{NEGATION_MARKER}{WILDCARD_TOKEN}"),
            PolicyMode::AllowListed => String::new(),
            PolicyMode::DenyListed => NEGATION_MARKER.to_string(),
        };
        let codes: Vec<String> = self.codes.iter().map(|c| format!("{prefix}{c}")).collect();
        f.write_str(&codes.join(","))
    }
}

fn is_deny_wildcard(token: &str) -> bool {
    token
        .strip_prefix(NEGATION_MARKER)
        .is_some_and(|body| body.eq_ignore_ascii_case(WILDCARD_TOKEN))
}
