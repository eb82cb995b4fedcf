//! Domain normalization.
//!
//! Turns raw domain candidates (hostname, container name, compose labels)
//! into the names written to the hosts file by applying the configured
//! prefix and suffix.
//!
//! # Prefix guard
//!
//! The prefix step is skipped when the name already starts with the
//! **suffix** ([`PrefixGuard::Suffix`], the default). This matches the
//! behavior deployed installations rely on, but it means a non-empty prefix
//! is applied again on every pass, so `normalize` is only idempotent when the
//! prefix is empty. [`PrefixGuard::Prefix`] checks the prefix instead and is
//! idempotent for every input.

use serde::{Deserialize, Serialize};

/// Which string guards the prefix step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixGuard {
    /// Skip the prefix when the name starts with the suffix.
    #[default]
    Suffix,
    /// Skip the prefix when the name starts with the prefix.
    Prefix,
}

/// Normalizes `raw` with the default [`PrefixGuard::Suffix`] rule.
///
/// ```
/// use hostsync_core::domain::normalize;
///
/// assert_eq!(normalize("web", "", ".docker"), "web.docker");
/// assert_eq!(normalize("web.docker", "", ".docker"), "web.docker");
/// assert_eq!(normalize("web", "dev-", ".docker"), "dev-web.docker");
/// ```
pub fn normalize(raw: &str, prefix: &str, suffix: &str) -> String {
    normalize_guarded(raw, prefix, suffix, PrefixGuard::Suffix)
}

/// Normalizes `raw`, choosing the prefix guard explicitly.
pub fn normalize_guarded(raw: &str, prefix: &str, suffix: &str, guard: PrefixGuard) -> String {
    let guard_str = match guard {
        PrefixGuard::Suffix => suffix,
        PrefixGuard::Prefix => prefix,
    };

    let mut domain = if !prefix.is_empty() && !raw.starts_with(guard_str) {
        format!("{prefix}{raw}")
    } else {
        raw.to_owned()
    };

    if !suffix.is_empty() && !domain.ends_with(suffix) {
        domain.push_str(suffix);
    }
    domain
}

/// Prefix/suffix rules applied to every domain added to the host table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainRules {
    /// Prepended to every domain (empty = none)
    pub prefix: String,
    /// Appended to every domain (empty = none)
    pub suffix: String,
    /// Prefix guard
    pub guard: PrefixGuard,
}

impl DomainRules {
    /// Creates rules using the default prefix guard.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            guard: PrefixGuard::default(),
        }
    }

    /// Overrides the prefix guard.
    pub fn with_guard(mut self, guard: PrefixGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Normalizes a single name.
    pub fn normalize(&self, raw: &str) -> String {
        normalize_guarded(raw, &self.prefix, &self.suffix, self.guard)
    }

    /// Normalizes a candidate list.
    ///
    /// Absent and empty candidates are skipped. The result holds no
    /// duplicates (exact match) and keeps first-seen order.
    pub fn normalize_all<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut domains: Vec<String> = Vec::new();
        for candidate in candidates.into_iter().flatten() {
            let raw = candidate.as_ref();
            if raw.is_empty() {
                continue;
            }
            let domain = self.normalize(raw);
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}
