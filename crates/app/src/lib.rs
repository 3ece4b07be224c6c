//! `integrador-app` — application shell for the client core.
//!
//! Owns the process-wide singletons (session store, query cache, services)
//! as one explicit context object with `init`/`dispose` lifecycle, maps the
//! route surface through the access gate, and guards rendering against
//! unexpected panics.

pub mod config;
pub mod context;
pub mod recovery;
pub mod routes;

pub use config::AppConfig;
pub use context::AppContext;
pub use recovery::{RecoveryAction, RenderFailure, catch_render_panic};
pub use routes::{Page, RouteOutcome, SIGN_IN_PATH, SIGN_UP_PATH, resolve};
