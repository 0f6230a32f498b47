use crate::form::{self, FormField, FormState};
use crate::gate::{GateDecision, SessionGate};
use crate::model::Credentials;
use crate::navigation::{Reason, Route};

use super::{send, ScreenContext, SubmitOutcome};

/// Shown after the backend accepts the credentials.
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

/// Fields of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoginField {
    /// Required.
    Username,
    /// Required, at least six characters.
    Password,
}

impl FormField for LoginField {
    fn all() -> &'static [Self] {
        &[LoginField::Username, LoginField::Password]
    }

    fn validate(self, value: &str, _form: &FormState<Self>) -> Option<String> {
        match self {
            LoginField::Username => form::username(value),
            LoginField::Password => form::password(value),
        }
    }
}

/// Login form. Mounting it with a live session moves straight on.
pub struct LoginScreen {
    form: FormState<LoginField>,
    loading: bool,
    gate: SessionGate,
}

impl LoginScreen {
    /// Empty form.
    pub fn new(ctx: &ScreenContext) -> Self {
        Self {
            form: FormState::new(),
            loading: false,
            gate: SessionGate::new(Route::Login, ctx.session_rule),
        }
    }

    /// Values and errors.
    pub fn form(&self) -> &FormState<LoginField> {
        &self.form
    }

    /// Mount-time checks, also used for the post-login probe.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Whether a submit is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Store a value and return its validation error, if any.
    pub fn set_field(&mut self, field: LoginField, value: impl Into<String>) -> Option<&str> {
        self.form.set(field, value)
    }

    /// An existing session skips the form and goes straight on.
    pub async fn mount(&mut self, ctx: &ScreenContext, incoming: Option<Reason>) -> GateDecision {
        self.gate.mount(&ctx.api, ctx.notifier(), incoming).await
    }

    /// Validate and log in, then probe onboarding once to pick the destination.
    pub async fn submit(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        if !self.form.validate_all() {
            return SubmitOutcome::Invalid;
        }

        self.loading = true;
        let outcome = self.submit_inner(ctx).await;
        self.loading = false;
        outcome
    }

    async fn submit_inner(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        let credentials = Credentials {
            username: self.form.value(LoginField::Username).to_string(),
            password: self.form.value(LoginField::Password).to_string(),
        };

        match send(ctx.notifier(), "login", ctx.api.login(&credentials)).await {
            Ok(_) => {
                ctx.notifier().success(LOGIN_SUCCESS_MESSAGE);
                match self.gate.route_after_login(&ctx.api, ctx.notifier()).await {
                    GateDecision::Redirect(intent) => SubmitOutcome::Navigate(intent),
                    GateDecision::Render | GateDecision::Hold => SubmitOutcome::Hold,
                }
            }
            Err(SubmitOutcome::Conflict(message)) => {
                self.form.set_error(LoginField::Username, message.clone());
                SubmitOutcome::Conflict(message)
            }
            Err(outcome) => outcome,
        }
    }
}
