//! Headless screens: validated forms, mount-time gating, and one submit discipline.
//!
//! Every submit follows the same branch on the normalized envelope:
//! 200 continues in the screen, 409 lands on a field, any other code becomes a global error
//! notification with the server's message, and a transport failure becomes the generic
//! "try again" notification. `loading` is raised for the duration and lowered on every exit.

mod body_details;
mod create_log;
mod dashboard;
mod log_list;
mod login;
mod signup;

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

pub use body_details::{BodyDetailsField, BodyDetailsScreen};
pub use create_log::{CreateLogField, CreateLogScreen};
pub use dashboard::{DashboardScreen, MonthTile, NO_LOGS_PLACEHOLDER};
pub use log_list::{CalorieField, LogListScreen};
pub use login::{LoginField, LoginScreen};
pub use signup::{SignupField, SignupScreen};

use crate::api::CalometerApi;
use crate::envelope::{Envelope, Outcome, GENERIC_FAILURE_MESSAGE};
use crate::error::TransportError;
use crate::gate::SessionRule;
use crate::navigation::{NavigationIntent, Reason, Route};
use crate::notify::Notifier;

/// Capabilities a screen needs: the API, the notifier, and the session rule its gate applies.
#[derive(Clone)]
pub struct ScreenContext {
    /// Backend calls.
    pub api: CalometerApi,
    /// Sink for user-facing messages.
    pub notifier: Arc<dyn Notifier>,
    /// Rule every gate applies to probe codes.
    pub session_rule: SessionRule,
}

impl ScreenContext {
    /// Bundle the screen capabilities.
    pub fn new(api: CalometerApi, notifier: Arc<dyn Notifier>, session_rule: SessionRule) -> Self {
        Self {
            api,
            notifier,
            session_rule,
        }
    }

    /// The notifier as a trait object.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}

/// How a submit ended. Submits borrow their screen mutably, so a second call on the same
/// screen cannot start while one is in flight; `loading` only reports the pending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Client-side validation failed; nothing was sent.
    Invalid,
    /// Accepted; leave for another screen.
    Navigate(NavigationIntent),
    /// Accepted, and the screen stays where it is.
    Completed,
    /// Accepted, but the follow-up probe could not decide where to go.
    Hold,
    /// 409, attached to a field when the screen has one for it.
    Conflict(String),
    /// Any other non-200 code, shown globally.
    Rejected {
        /// Application code, when one was decoded.
        code: Option<u16>,
        /// Message shown to the user.
        message: String,
    },
    /// The call never completed.
    TransportFailed,
}

/// Await a backend call and branch on it. `Ok` carries a 200 envelope; every other branch has
/// already been reported except `Conflict`, which the caller routes to a field.
pub(crate) async fn send(
    notifier: &dyn Notifier,
    action: &'static str,
    call: impl Future<Output = Result<Envelope, TransportError>>,
) -> Result<Envelope, SubmitOutcome> {
    let envelope = match call.await {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(action, error = %err, "request failed");
            notifier.error(GENERIC_FAILURE_MESSAGE);
            return Err(SubmitOutcome::TransportFailed);
        }
    };

    let rejected = match envelope.outcome() {
        Outcome::Ok => return Ok(envelope),
        Outcome::Conflict(message) => return Err(SubmitOutcome::Conflict(message.to_string())),
        Outcome::Unauthorized(_) | Outcome::Failed { .. } | Outcome::Unknown => {
            SubmitOutcome::Rejected {
                code: envelope.app_code(),
                message: envelope.message_or_generic().to_string(),
            }
        }
    };
    if let SubmitOutcome::Rejected { code, message } = &rejected {
        warn!(action, code = ?code, text = %message, "request rejected");
        notifier.error(message);
    }
    Err(rejected)
}

/// Report a conflict globally when the screen has no field for it.
pub(crate) fn conflict_to_global(notifier: &dyn Notifier, outcome: SubmitOutcome) -> SubmitOutcome {
    if let SubmitOutcome::Conflict(message) = &outcome {
        notifier.error(message);
    }
    outcome
}

/// Shown after logout.
pub const LOGOUT_SUCCESS_MESSAGE: &str = "Logged out successfully";

/// Logout shared by the dashboard and onboarding screens; lands on Login tagged with `from`.
pub(crate) async fn logout(ctx: &ScreenContext, loading: &mut bool, from: Route) -> SubmitOutcome {
    *loading = true;
    let outcome = match send(ctx.notifier(), "logout", ctx.api.logout()).await {
        Ok(_) => {
            ctx.notifier().success(LOGOUT_SUCCESS_MESSAGE);
            SubmitOutcome::Navigate(NavigationIntent::new(Route::Login, Reason::leaving(from)))
        }
        Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
    };
    *loading = false;
    outcome
}
