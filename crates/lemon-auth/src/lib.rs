//! # lemon-auth — Role Registry and Authorization Policy
//!
//! Pure access-control decision logic for the Lemon Stack. Nothing in
//! this crate performs I/O: the role registry resolves a principal's
//! role memberships into a [`RoleSet`] once per request, and the policy
//! evaluates set-membership predicates over that set.
//!
//! ## Design
//!
//! - **Roles are a set, not a field.** A principal may hold zero, one,
//!   or several of Customer, DeliveryCrew, Manager simultaneously.
//!   Every rule is a predicate over the set — there is no exclusive
//!   switch dispatch anywhere.
//! - **One decision function.** [`policy::authorize`] is the single
//!   entry point gating every state-changing operation; handlers never
//!   test roles inline.
//! - **Deny carries its caller-visible class.** Each rule knows whether
//!   its denial reads as `Unauthorized` (no entitled role) or
//!   `Forbidden` (role-eligible but not for this resource instance),
//!   matching the observed service behavior per action.

pub mod policy;
pub mod principal;
pub mod role;

pub use policy::{authorize, order_list_scope, Action, OrderScope, PolicyError};
pub use principal::Principal;
pub use role::{Role, RoleSet};
