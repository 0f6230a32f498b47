//! Session and onboarding gate shared by every protected screen.
//!
//! A gate probes the backend when its screen mounts and decides whether the screen renders or
//! the user is sent elsewhere. Transport failures never redirect: the gate settles in
//! [`GateState::Neutral`] so a flaky network cannot bounce the user between screens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{body_details_exist_flag, CalometerApi};
use crate::envelope::{codes, Envelope, GENERIC_FAILURE_MESSAGE};
use crate::error::{ConfigError, TransportError};
use crate::navigation::{NavigationIntent, Reason, Route};
use crate::notify::Notifier;

/// Which application codes mean "the session is gone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionRule {
    /// Only 401.
    #[default]
    Unauthorized,
    /// Anything other than 200.
    NotOk,
}

impl SessionRule {
    /// Whether `app_code` from a probe means the session has expired.
    pub fn session_invalid(self, app_code: u16) -> bool {
        match self {
            SessionRule::Unauthorized => app_code == codes::UNAUTHORIZED,
            SessionRule::NotOk => app_code != codes::OK,
        }
    }
}

impl FromStr for SessionRule {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unauthorized" | "401" => Ok(SessionRule::Unauthorized),
            "not-ok" | "not_ok" | "notok" => Ok(SessionRule::NotOk),
            _ => Err(ConfigError::UnknownSessionRule(raw.to_string())),
        }
    }
}

impl fmt::Display for SessionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRule::Unauthorized => f.write_str("unauthorized"),
            SessionRule::NotOk => f.write_str("not-ok"),
        }
    }
}

/// Where a gate is in its mount-time checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Nothing has run yet.
    Unchecked,
    /// A probe is in flight.
    Checking,
    /// The screen may render.
    Allowed,
    /// Sending the user to Login.
    RedirectLogin,
    /// Sending the user to the onboarding form.
    RedirectOnboarding,
    /// Sending the user to Dashboard.
    RedirectDashboard,
    /// A probe failed; the screen stays put without rendering protected content.
    Neutral,
}

/// What the screen does once its gate settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show the screen.
    Render,
    /// Leave for another screen.
    Redirect(NavigationIntent),
    /// Stay, showing no protected content.
    Hold,
}

/// Result of the body-details probe, independent of which screen asked.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Onboarding {
    Complete,
    Pending,
    SessionInvalid,
    Failed(String),
}

/// Mount-time session and onboarding checks for one screen.
pub struct SessionGate {
    screen: Route,
    rule: SessionRule,
    state: GateState,
    probes: usize,
}

impl SessionGate {
    /// Gate for `screen`, judging probe codes by `rule`.
    pub fn new(screen: Route, rule: SessionRule) -> Self {
        Self {
            screen,
            rule,
            state: GateState::Unchecked,
            probes: 0,
        }
    }

    /// Screen this gate guards.
    pub fn screen(&self) -> Route {
        self.screen
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Probes issued since the gate was created.
    pub fn probes_issued(&self) -> usize {
        self.probes
    }

    /// Whether arriving with `reason` means the sender already ran this screen's checks.
    /// Signup never probes.
    pub fn already_checked(screen: Route, reason: Option<Reason>) -> bool {
        match screen {
            Route::Signup => true,
            Route::Login => matches!(reason, Some(Reason::Dashboard | Reason::AddBodyDetails)),
            Route::Dashboard | Route::AddBodyDetails => reason == Some(Reason::Login),
        }
    }

    /// Run the mount-time checks for this screen.
    pub async fn mount(
        &mut self,
        api: &CalometerApi,
        notifier: &dyn Notifier,
        incoming: Option<Reason>,
    ) -> GateDecision {
        self.state = GateState::Unchecked;
        if Self::already_checked(self.screen, incoming) {
            debug!(screen = %self.screen, reason = ?incoming, "gate skipped");
            return self.settle(GateState::Allowed);
        }

        self.state = GateState::Checking;
        if self.screen == Route::Login {
            return self.mount_login(api, notifier).await;
        }
        let onboarding = self.probe_onboarding(api).await;
        self.decide_protected(onboarding, notifier)
    }

    /// After a successful login: exactly one body-details probe, then onward with reason
    /// `Login`.
    pub async fn route_after_login(
        &mut self,
        api: &CalometerApi,
        notifier: &dyn Notifier,
    ) -> GateDecision {
        self.state = GateState::Checking;
        let onboarding = self.probe_onboarding(api).await;
        self.decide_onward(onboarding, Reason::Login, notifier)
    }

    async fn mount_login(&mut self, api: &CalometerApi, notifier: &dyn Notifier) -> GateDecision {
        self.probes += 1;
        match api.check_session().await {
            Ok(envelope) if envelope.is_ok() => {
                info!("session still valid, skipping login form");
                let onboarding = self.probe_onboarding(api).await;
                self.decide_onward(onboarding, Reason::Login, notifier)
            }
            // No valid session: show the login form.
            Ok(_) => self.settle(GateState::Allowed),
            Err(err) => self.transport_failed(err, notifier),
        }
    }

    async fn probe_onboarding(&mut self, api: &CalometerApi) -> Result<Onboarding, TransportError> {
        self.probes += 1;
        let envelope = api.body_details_exist().await?;
        Ok(self.classify(&envelope))
    }

    fn classify(&self, envelope: &Envelope) -> Onboarding {
        if let Some(exists) = body_details_exist_flag(envelope) {
            return if exists {
                Onboarding::Complete
            } else {
                Onboarding::Pending
            };
        }
        match envelope.app_code() {
            Some(codes::OK) => Onboarding::Pending,
            Some(code) if self.rule.session_invalid(code) => Onboarding::SessionInvalid,
            _ => Onboarding::Failed(envelope.message_or_generic().to_string()),
        }
    }

    /// Decision for Login (and the post-login step): always move on once the session is known.
    fn decide_onward(
        &mut self,
        onboarding: Result<Onboarding, TransportError>,
        reason: Reason,
        notifier: &dyn Notifier,
    ) -> GateDecision {
        match onboarding {
            Ok(Onboarding::Complete) => {
                self.redirect(GateState::RedirectDashboard, Route::Dashboard, reason)
            }
            Ok(Onboarding::Pending) => {
                self.redirect(GateState::RedirectOnboarding, Route::AddBodyDetails, reason)
            }
            Ok(Onboarding::SessionInvalid) => self.settle(GateState::Allowed),
            Ok(Onboarding::Failed(message)) => self.failed(&message, notifier),
            Err(err) => self.transport_failed(err, notifier),
        }
    }

    /// Decision for Dashboard and AddBodyDetails.
    fn decide_protected(
        &mut self,
        onboarding: Result<Onboarding, TransportError>,
        notifier: &dyn Notifier,
    ) -> GateDecision {
        let reason = Reason::leaving(self.screen);
        match (self.screen, onboarding) {
            (_, Ok(Onboarding::SessionInvalid)) => {
                self.redirect(GateState::RedirectLogin, Route::Login, reason)
            }
            (Route::Dashboard, Ok(Onboarding::Complete))
            | (Route::AddBodyDetails, Ok(Onboarding::Pending)) => self.settle(GateState::Allowed),
            (_, Ok(Onboarding::Complete)) => {
                self.redirect(GateState::RedirectDashboard, Route::Dashboard, reason)
            }
            (_, Ok(Onboarding::Pending)) => {
                self.redirect(GateState::RedirectOnboarding, Route::AddBodyDetails, reason)
            }
            (_, Ok(Onboarding::Failed(message))) => self.failed(&message, notifier),
            (_, Err(err)) => self.transport_failed(err, notifier),
        }
    }

    fn redirect(&mut self, state: GateState, target: Route, reason: Reason) -> GateDecision {
        self.state = state;
        info!(screen = %self.screen, target = %target, reason = %reason, "gate redirect");
        GateDecision::Redirect(NavigationIntent::new(target, reason))
    }

    fn settle(&mut self, state: GateState) -> GateDecision {
        self.state = state;
        match state {
            GateState::Allowed => GateDecision::Render,
            _ => GateDecision::Hold,
        }
    }

    fn failed(&mut self, message: &str, notifier: &dyn Notifier) -> GateDecision {
        warn!(screen = %self.screen, text = message, "gate probe rejected");
        notifier.error(message);
        self.settle(GateState::Neutral)
    }

    fn transport_failed(&mut self, err: TransportError, notifier: &dyn Notifier) -> GateDecision {
        warn!(screen = %self.screen, error = %err, "gate probe failed");
        notifier.error(GENERIC_FAILURE_MESSAGE);
        self.settle(GateState::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_rules_differ_only_on_other_failures() {
        assert!(SessionRule::Unauthorized.session_invalid(401));
        assert!(!SessionRule::Unauthorized.session_invalid(500));
        assert!(SessionRule::NotOk.session_invalid(500));
        assert!(!SessionRule::NotOk.session_invalid(200));
        assert_eq!("not_ok".parse::<SessionRule>().unwrap(), SessionRule::NotOk);
        assert_eq!(SessionRule::NotOk.to_string(), "not-ok");
    }

    #[test]
    fn skip_rules_per_screen() {
        assert!(SessionGate::already_checked(Route::Dashboard, Some(Reason::Login)));
        assert!(!SessionGate::already_checked(Route::Dashboard, Some(Reason::Nav)));
        assert!(!SessionGate::already_checked(Route::Dashboard, None));
        assert!(!SessionGate::already_checked(Route::Dashboard, Some(Reason::AddBodyDetails)));
        assert!(SessionGate::already_checked(Route::AddBodyDetails, Some(Reason::Login)));
        assert!(!SessionGate::already_checked(Route::AddBodyDetails, Some(Reason::Dashboard)));
        assert!(!SessionGate::already_checked(Route::AddBodyDetails, None));
        assert!(SessionGate::already_checked(Route::Login, Some(Reason::Dashboard)));
        assert!(SessionGate::already_checked(Route::Login, Some(Reason::AddBodyDetails)));
        assert!(!SessionGate::already_checked(Route::Login, Some(Reason::Nav)));
        assert!(!SessionGate::already_checked(Route::Login, None));
        assert!(SessionGate::already_checked(Route::Signup, None));
    }
}
