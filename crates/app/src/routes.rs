//! Route surface and its mapping through the access gate.
//!
//! Routing is a pure function of the path and the session state, so the
//! gate's behavior is enforced in exactly one place and is testable
//! without a view layer.

use integrador_auth::gate::{self, GateDecision};
use integrador_auth::session::SessionState;

pub const SIGN_IN_PATH: &str = "/auth/login";
pub const SIGN_UP_PATH: &str = "/auth/signup";

/// Every renderable page of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    SignIn,
    SignUp,
    Dashboard,
    Profile,
    EditProfile,
    OrganizationSettings,
    Users,
}

/// What the shell should do for a given path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Render the page.
    Render(Page),
    /// Session still initializing; show the loading indicator, render
    /// nothing protected yet.
    Loading,
    /// Navigate away. `replace` drops the current history entry so Back
    /// cannot land on a gated page.
    Redirect { to: &'static str, replace: bool },
}

/// Resolve a path against the current session state.
///
/// Public pages render regardless of session state. Protected pages go
/// through the gate. Unknown paths redirect to sign-in unconditionally,
/// authenticated or not.
pub fn resolve(path: &str, state: &SessionState) -> RouteOutcome {
    match path {
        SIGN_IN_PATH => return RouteOutcome::Render(Page::SignIn),
        SIGN_UP_PATH => return RouteOutcome::Render(Page::SignUp),
        _ => {}
    }

    let Some(page) = protected_page(path) else {
        tracing::debug!(path, "unknown route; redirecting to sign-in");
        return RouteOutcome::Redirect {
            to: SIGN_IN_PATH,
            replace: true,
        };
    };

    match gate::decide(state) {
        GateDecision::Loading => RouteOutcome::Loading,
        GateDecision::RedirectToSignIn { replace } => RouteOutcome::Redirect {
            to: SIGN_IN_PATH,
            replace,
        },
        GateDecision::Admit => RouteOutcome::Render(page),
    }
}

fn protected_page(path: &str) -> Option<Page> {
    match path {
        "/" => Some(Page::Dashboard),
        "/profile" => Some(Page::Profile),
        "/profile/edit" => Some(Page::EditProfile),
        "/org/settings" => Some(Page::OrganizationSettings),
        "/users" => Some(Page::Users),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
