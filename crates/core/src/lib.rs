//! `integrador-core` — shared foundation for the client core.
//!
//! This crate contains **pure** building blocks (no I/O, no runtime):
//! typed identifiers and the error taxonomy every boundary speaks.

pub mod error;
pub mod id;

pub use error::{DataError, DataResult};
pub use id::{TenantId, UserId};
