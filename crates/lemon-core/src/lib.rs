//! # lemon-core — Foundational Types for the Lemon Stack
//!
//! This crate is the bedrock of the Lemon Stack order-management service.
//! It defines the domain-primitive newtypes shared by every other crate
//! in the workspace; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `UserId`, `CategoryId`,
//!    `MenuItemId`, `CartLineId`, `OrderId`, `Username` — all newtypes.
//!    No bare UUIDs or strings cross a crate boundary.
//!
//! 2. **Exact decimal money.** Prices are `rust_decimal::Decimal`
//!    (Postgres `NUMERIC`) in their natural form. Never floats, never
//!    cents. Helpers in [`money`] validate and combine amounts.
//!
//! 3. **Validated construction.** `Username` rejects malformed input at
//!    construction and at deserialization time — not silently accepted.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lemon-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;

pub use error::ValidationError;
pub use identity::{CartLineId, CategoryId, MenuItemId, OrderId, OrderItemId, UserId, Username};
pub use money::{line_total, validate_price, validate_quantity};
