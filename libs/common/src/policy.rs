//! Role-based authorization
//!
//! Handlers never compare role strings themselves: they name the capability
//! they need and [`authorize`] maps it to the required role.

use serde::Serialize;
use std::fmt;

use crate::error::{DomainError, DomainResult};
use crate::models::{ADMIN_ROLE, Profile};

/// Something a mutating operation needs the caller to be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Capability {
    ManageFacilities,
    ManageUsers,
    ManageBookings,
    ManagePayments,
}

impl Capability {
    /// Role that grants the capability
    pub fn required_role(self) -> &'static str {
        match self {
            Capability::ManageFacilities
            | Capability::ManageUsers
            | Capability::ManageBookings
            | Capability::ManagePayments => ADMIN_ROLE,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ManageFacilities => "managing facilities",
            Capability::ManageUsers => "managing users",
            Capability::ManageBookings => "managing bookings",
            Capability::ManagePayments => "managing payments",
        };
        f.write_str(name)
    }
}

/// Fail unless the profile holds a role named exactly `role_name`
pub fn require_role(profile: &Profile, role_name: &str, capability: Capability) -> DomainResult<()> {
    if profile.has_role(role_name) {
        Ok(())
    } else {
        tracing::warn!(
            "User {} lacks role {} for {}",
            profile.id,
            role_name,
            capability
        );
        Err(DomainError::Forbidden(capability))
    }
}

pub fn authorize(profile: &Profile, capability: Capability) -> DomainResult<()> {
    require_role(profile, capability.required_role(), capability)
}

pub fn is_allowed(profile: &Profile, capability: Capability) -> bool {
    profile.has_role(capability.required_role())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_ROLE, Role};
    use uuid::Uuid;

    fn profile_with(roles: &[&str]) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            roles: roles
                .iter()
                .map(|name| Role {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn admins_hold_every_capability() {
        let admin = profile_with(&[ADMIN_ROLE, DEFAULT_ROLE]);
        for capability in [
            Capability::ManageFacilities,
            Capability::ManageUsers,
            Capability::ManageBookings,
            Capability::ManagePayments,
        ] {
            assert!(authorize(&admin, capability).is_ok());
        }
    }

    #[test]
    fn plain_users_are_forbidden() {
        let user = profile_with(&[DEFAULT_ROLE]);
        let err = authorize(&user, Capability::ManageFacilities).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(Capability::ManageFacilities)));
        assert!(!is_allowed(&user, Capability::ManageBookings));
    }

    #[test]
    fn role_names_match_case_sensitively() {
        let shouting = profile_with(&["ADMIN", "admin"]);
        assert!(authorize(&shouting, Capability::ManageUsers).is_err());
        assert!(require_role(&shouting, "admin", Capability::ManageUsers).is_ok());
    }
}
