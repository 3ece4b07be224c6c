//! `integrador-auth` — session lifecycle and route gating.
//!
//! This crate is the single source of truth for "who is logged in". It is
//! intentionally decoupled from any view layer and from the identity
//! provider's transport: the provider is reached only through the
//! [`IdentityProvider`] boundary, and session state is published through a
//! watch channel that the gate and the app shell observe.

pub mod gate;
pub mod identity;
pub mod provider;
pub mod session;

pub use gate::{GateDecision, decide};
pub use identity::Identity;
pub use provider::{IdentityProvider, SessionEvent, Subscription};
pub use session::{SessionState, SessionStore};
