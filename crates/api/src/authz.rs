//! API-side authorization policy.
//!
//! Reads are open to every authenticated principal; writes check a
//! `{area}.{entity}.write` permission derived from the token roles.

use edugest_auth::{AuthzError, Permission, Principal, Role, authorize};

use crate::context::PrincipalContext;

/// Check one permission for the current request principal.
pub fn authorize_request(
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        roles: principal.roles().to_vec(),
        permissions: principal.permissions().to_vec(),
    };
    authorize(&principal, required)
}

/// Static policy mapping each role to its permissions.
///
/// - `admin`: everything
/// - `secretary`: academic structure, staff and enrollment
/// - `finance`: fee items, invoices and the SAF-T export
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut permissions = Vec::new();
    for role in roles {
        match role.as_str() {
            "admin" => return vec![Permission::new("*")],
            "secretary" => permissions.extend([
                Permission::new("academics.*"),
                Permission::new("staff.*"),
                Permission::new("enrollment.*"),
            ]),
            "finance" => permissions.extend([
                Permission::new("billing.*"),
                Permission::new("saft.export"),
            ]),
            _ => {}
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use edugest_auth::PrincipalId;

    use super::*;

    fn principal(roles: &[&'static str]) -> PrincipalContext {
        PrincipalContext::new(
            PrincipalId::new(),
            roles.iter().map(|r| Role::new(*r)).collect(),
        )
    }

    #[test]
    fn admin_is_granted_everything() {
        let admin = principal(&["admin"]);
        assert!(authorize_request(&admin, &Permission::new("billing.invoices.write")).is_ok());
        assert!(authorize_request(&admin, &Permission::new("saft.export")).is_ok());
    }

    #[test]
    fn secretary_cannot_issue_invoices() {
        let secretary = principal(&["secretary"]);
        assert!(authorize_request(&secretary, &Permission::new("enrollment.students.write")).is_ok());
        assert_eq!(
            authorize_request(&secretary, &Permission::new("billing.invoices.write")),
            Err(AuthzError::Forbidden("billing.invoices.write".into()))
        );
    }

    #[test]
    fn roles_combine() {
        let both = principal(&["secretary", "finance"]);
        assert!(authorize_request(&both, &Permission::new("academics.courses.write")).is_ok());
        assert!(authorize_request(&both, &Permission::new("saft.export")).is_ok());

        let unknown = principal(&["viewer"]);
        assert!(unknown.permissions().is_empty());
    }
}
