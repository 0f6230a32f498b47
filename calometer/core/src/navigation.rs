//! Screen routes and the one-shot intent that travels with each transition.

use std::fmt;

/// A screen the user can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/login`
    Login,
    /// `/signup`
    Signup,
    /// `/dashboard`
    Dashboard,
    /// `/add_body_details`, the onboarding form.
    AddBodyDetails,
}

impl Route {
    /// Location path of the screen.
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::AddBodyDetails => "/add_body_details",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Why a transition happened. The destination uses it to skip probes the sender already ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// Sent by Login after its probes.
    Login,
    /// Plain link, no checks implied.
    Nav,
    /// Sent by Dashboard.
    Dashboard,
    /// Sent by the onboarding screen.
    AddBodyDetails,
}

impl Reason {
    /// Tag a screen attaches when it sends the user elsewhere.
    pub fn leaving(route: Route) -> Self {
        match route {
            Route::Login => Reason::Login,
            Route::Signup => Reason::Nav,
            Route::Dashboard => Reason::Dashboard,
            Route::AddBodyDetails => Reason::AddBodyDetails,
        }
    }

    /// Wire-style name, e.g. `addBodyDetails`.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Login => "login",
            Reason::Nav => "nav",
            Reason::Dashboard => "dashboard",
            Reason::AddBodyDetails => "addBodyDetails",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationIntent {
    /// Destination screen.
    pub target: Route,
    /// Why the sender is navigating.
    pub reason: Reason,
}

impl NavigationIntent {
    /// Build an intent.
    pub fn new(target: Route, reason: Reason) -> Self {
        Self { target, reason }
    }
}

/// Current route plus the pending intent, which the next mount consumes exactly once.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    pending: Option<NavigationIntent>,
    history: Vec<NavigationIntent>,
}

impl Navigator {
    /// Start on `start` with nothing pending.
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            pending: None,
            history: Vec::new(),
        }
    }

    /// Route the user is on.
    pub fn current(&self) -> Route {
        self.current
    }

    /// Move to the intent's target and hold its reason for [`Self::arrive`].
    pub fn navigate(&mut self, intent: NavigationIntent) {
        tracing::debug!(
            from = %self.current,
            to = %intent.target,
            reason = %intent.reason,
            "navigate"
        );
        self.current = intent.target;
        self.pending = Some(intent);
        self.history.push(intent);
    }

    /// Take the reason attached to the transition into the current route. Returns `None` on
    /// the second call, or when the pending intent targets another route.
    pub fn arrive(&mut self) -> Option<Reason> {
        let intent = self.pending.take()?;
        (intent.target == self.current).then_some(intent.reason)
    }

    /// Every intent taken, oldest first.
    pub fn history(&self) -> &[NavigationIntent] {
        &self.history
    }
}
