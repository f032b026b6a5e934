use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.permissions.iter().any(|p| p.grants(required)) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %principal.principal_id,
            required = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, Role};

    fn principal(perms: &[&'static str]) -> Principal {
        Principal {
            principal_id: PrincipalId::new(),
            roles: vec![Role::new("secretary")],
            permissions: perms.iter().map(|p| Permission::new(*p)).collect(),
        }
    }

    #[test]
    fn allows_matching_grant() {
        let p = principal(&["enrollment.*"]);
        assert!(authorize(&p, &Permission::new("enrollment.students.write")).is_ok());
    }

    #[test]
    fn denies_and_names_missing_permission() {
        let p = principal(&["enrollment.*"]);
        assert_eq!(
            authorize(&p, &Permission::new("saft.export")),
            Err(AuthzError::Forbidden("saft.export".to_string()))
        );
    }

    #[test]
    fn no_permissions_denies_everything() {
        assert!(authorize(&principal(&[]), &Permission::new("academics.courses.read")).is_err());
    }
}
