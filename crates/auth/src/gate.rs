//! Access gate: what to render for a protected view subtree.

use crate::SessionState;

/// Gate outcome for a protected subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// First session check still pending: show a placeholder, never mount
    /// the protected subtree — not even transiently.
    Loading,
    /// Unauthenticated: send the user to the sign-in entry point.
    ///
    /// `replace` is always true so the blocked page leaves no
    /// back-navigable history entry (no back-button bypass).
    RedirectToSignIn { replace: bool },
    /// Authenticated: mount the protected subtree.
    Admit,
}

/// Decide the gate outcome. Pure function of `(initializing, authenticated)`.
pub fn decide(state: &SessionState) -> GateDecision {
    if state.initializing {
        return GateDecision::Loading;
    }
    if !state.is_authenticated() {
        return GateDecision::RedirectToSignIn { replace: true };
    }
    GateDecision::Admit
}
