use crate::form::{self, FormField, FormState};
use crate::model::SignupRequest;
use crate::navigation::{NavigationIntent, Reason, Route};

use super::{send, ScreenContext, SubmitOutcome};

/// Shown after the account is created.
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created, please log in.";

/// Fields of the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignupField {
    /// Letters and spaces.
    FullName,
    /// Required; must be unused.
    Username,
    /// At least six characters.
    Password,
    /// Must equal [`SignupField::Password`] exactly.
    ConfirmPassword,
}

impl FormField for SignupField {
    fn all() -> &'static [Self] {
        &[
            SignupField::FullName,
            SignupField::Username,
            SignupField::Password,
            SignupField::ConfirmPassword,
        ]
    }

    fn validate(self, value: &str, form: &FormState<Self>) -> Option<String> {
        match self {
            SignupField::FullName => form::full_name(value),
            SignupField::Username => form::username(value),
            SignupField::Password => form::password(value),
            SignupField::ConfirmPassword => {
                form::confirm_password(value, form.value(SignupField::Password))
            }
        }
    }
}

/// Signup has no gate: it is reachable with or without a session.
#[derive(Default)]
pub struct SignupScreen {
    form: FormState<SignupField>,
    loading: bool,
}

impl SignupScreen {
    /// Empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values and errors.
    pub fn form(&self) -> &FormState<SignupField> {
        &self.form
    }

    /// Whether a submit is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Store a value and return its validation error, if any.
    pub fn set_field(&mut self, field: SignupField, value: impl Into<String>) -> Option<&str> {
        self.form.set(field, value)
    }

    /// Validate and create the account; on success go to Login.
    pub async fn submit(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        if !self.form.validate_all() {
            return SubmitOutcome::Invalid;
        }

        let request = SignupRequest {
            name: self.form.value(SignupField::FullName).trim().to_string(),
            username: self.form.value(SignupField::Username).to_string(),
            password: self.form.value(SignupField::Password).to_string(),
        };

        self.loading = true;
        let outcome = match send(ctx.notifier(), "signup", ctx.api.signup(&request)).await {
            Ok(_) => {
                ctx.notifier().success(SIGNUP_SUCCESS_MESSAGE);
                SubmitOutcome::Navigate(NavigationIntent::new(Route::Login, Reason::Nav))
            }
            Err(SubmitOutcome::Conflict(message)) => {
                self.form.set_error(SignupField::Username, message.clone());
                SubmitOutcome::Conflict(message)
            }
            Err(outcome) => outcome,
        };
        self.loading = false;
        outcome
    }
}
