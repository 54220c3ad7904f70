//! Cash custody policy.

use std::collections::BTreeSet;

/// Set of people allowed to hold cash for a payment.
///
/// An empty policy places no restriction on the custodian field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodyPolicy {
    allowed: BTreeSet<String>,
}

impl CustodyPolicy {
    /// Builds a policy from configured names. Blank names are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { allowed }
    }

    /// Policy that accepts any custodian.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// True when no names are configured.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_empty()
    }

    /// True when `name` may hold cash under this policy.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.is_unrestricted() || self.allowed.contains(name.trim())
    }
}
