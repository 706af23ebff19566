//! # Roles and Role Sets
//!
//! The three actor roles of the service and the set type principals
//! carry. Role names use kebab-case on the wire and in storage
//! (`customer`, `delivery-crew`, `manager`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An actor role. Roles are not mutually exclusive; membership is
/// carried in a [`RoleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Orders from the menu through a cart.
    Customer,
    /// Delivers placed orders and marks them delivered.
    DeliveryCrew,
    /// Administers the catalog, role groups, and order lifecycle.
    Manager,
}

impl Role {
    /// All roles, in ordinal order.
    pub const ALL: [Role; 3] = [Role::Customer, Role::DeliveryCrew, Role::Manager];

    /// Stable storage/wire name for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::DeliveryCrew => "delivery-crew",
            Role::Manager => "manager",
        }
    }

    /// Parse a storage/wire name back into a role.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "customer" => Some(Role::Customer),
            "delivery-crew" => Some(Role::DeliveryCrew),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Role::Customer => 0b001,
            Role::DeliveryCrew => 0b010,
            Role::Manager => 0b100,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of roles held by one principal.
///
/// Compact bitmask internally; serializes as a JSON array of role names
/// so responses read naturally (`["customer", "manager"]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// The empty role set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// A set containing a single role.
    pub fn only(role: Role) -> Self {
        Self(role.bit())
    }

    /// Whether the set contains `role`.
    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Whether the set contains any of the given roles.
    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }

    /// Insert a role. Idempotent.
    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    /// Remove a role. Idempotent — removing an absent role is a no-op.
    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the roles present, in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

impl Serialize for RoleSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

impl<'__s> utoipa::ToSchema<'__s> for RoleSet {
    fn schema() -> (
        &'__s str,
        utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
    ) {
        (
            "RoleSet",
            utoipa::openapi::ArrayBuilder::new()
                .items(utoipa::openapi::Ref::from_schema_name("Role"))
                .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_contains_nothing() {
        let set = RoleSet::empty();
        assert!(set.is_empty());
        for role in Role::ALL {
            assert!(!set.contains(role));
        }
    }

    #[test]
    fn insert_and_remove_are_idempotent() {
        let mut set = RoleSet::empty();
        set.insert(Role::Manager);
        set.insert(Role::Manager);
        assert!(set.contains(Role::Manager));

        set.remove(Role::Manager);
        assert!(!set.contains(Role::Manager));
        // Removing an absent role is a no-op, never an error.
        set.remove(Role::Manager);
        assert!(set.is_empty());
    }

    #[test]
    fn roles_are_not_mutually_exclusive() {
        let set: RoleSet = [Role::Manager, Role::DeliveryCrew].into_iter().collect();
        assert!(set.contains(Role::Manager));
        assert!(set.contains(Role::DeliveryCrew));
        assert!(!set.contains(Role::Customer));
    }

    #[test]
    fn contains_any() {
        let set = RoleSet::only(Role::DeliveryCrew);
        assert!(set.contains_any(&[Role::Customer, Role::DeliveryCrew]));
        assert!(!set.contains_any(&[Role::Customer, Role::Manager]));
    }

    #[test]
    fn role_name_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("sous-chef"), None);
    }

    #[test]
    fn role_set_serializes_as_name_array() {
        let set: RoleSet = [Role::Customer, Role::Manager].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["customer","manager"]"#);

        let parsed: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn role_set_display() {
        let set: RoleSet = [Role::DeliveryCrew, Role::Manager].into_iter().collect();
        assert_eq!(set.to_string(), "{delivery-crew, manager}");
    }
}
