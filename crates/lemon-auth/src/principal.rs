//! # Principals
//!
//! The authenticated-actor value the rest of the service operates on.
//! Identity verification happens upstream; by the time a [`Principal`]
//! exists, the gateway has vouched for the username and the role
//! registry has resolved the membership set.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use lemon_core::{UserId, Username};

use crate::role::{Role, RoleSet};

/// An authenticated actor and its resolved role memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Unique identifier of the principal.
    pub id: UserId,
    /// Username as forwarded by the authentication gateway.
    pub username: Username,
    /// Roles held by this principal. May be empty.
    pub roles: RoleSet,
}

impl Principal {
    /// Construct a principal from its parts.
    pub fn new(id: UserId, username: Username, roles: RoleSet) -> Self {
        Self { id, username, roles }
    }

    /// Whether the principal holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_role_membership() {
        let p = Principal::new(
            UserId::new(),
            Username::new("alice").unwrap(),
            RoleSet::only(Role::Customer),
        );
        assert!(p.has_role(Role::Customer));
        assert!(!p.has_role(Role::Manager));
    }
}
