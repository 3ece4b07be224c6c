//! Top-level rendering recovery.
//!
//! A panic inside a view must not take the whole shell down; it is caught
//! at the top, logged, and turned into a failure screen with a reload
//! action.

use std::panic::{AssertUnwindSafe, catch_unwind};

/// What the failure screen offers the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Restart the shell from scratch.
    Reload,
}

/// A caught rendering failure, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub message: String,
    pub action: RecoveryAction,
}

/// Run a render closure, converting a panic into a [`RenderFailure`].
pub fn catch_render_panic<R>(render: impl FnOnce() -> R) -> Result<R, RenderFailure> {
    catch_unwind(AssertUnwindSafe(render)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unexpected rendering failure".to_string());
        tracing::error!(message, "render panicked; offering reload");
        RenderFailure {
            message,
            action: RecoveryAction::Reload,
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
