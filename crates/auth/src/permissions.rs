use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are dotted strings, `{area}.{entity}.{action}` (e.g.
/// `"academics.courses.write"`). Grants may end in `.*` to cover a whole
/// area, and the bare wildcard `"*"` covers everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self.0 == required.0 {
            return true;
        }
        match self.as_str().strip_suffix(".*") {
            Some(prefix) => required
                .as_str()
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.')),
            None => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_grants_cover_only_their_area() {
        let grant = Permission::new("academics.*");
        assert!(grant.grants(&Permission::new("academics.courses.write")));
        assert!(!grant.grants(&Permission::new("academicsx.courses.write")));
        assert!(!grant.grants(&Permission::new("billing.invoices.write")));
        assert!(Permission::new("*").grants(&Permission::new("saft.export")));
        assert!(Permission::new("saft.export").grants(&Permission::new("saft.export")));
    }
}
