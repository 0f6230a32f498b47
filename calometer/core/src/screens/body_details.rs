use crate::form::{self, FormField, FormState};
use crate::gate::{GateDecision, SessionGate};
use crate::model::{BodyDetails, Gender, Goal};
use crate::navigation::{NavigationIntent, Reason, Route};

use super::{conflict_to_global, send, ScreenContext, SubmitOutcome};

/// Shown after the details are stored.
pub const BODY_DETAILS_SUCCESS_MESSAGE: &str = "Successfully added body details.";

/// Accepted ages in whole years, inclusive.
pub const AGE_RANGE: (f64, f64) = (20.0, 54.0);
/// Accepted weights in kilograms, inclusive, in steps of 0.5.
pub const WEIGHT_RANGE: (f64, f64) = (40.0, 150.0);
/// Accepted heights in whole centimetres, inclusive.
pub const HEIGHT_RANGE: (f64, f64) = (149.0, 196.0);

/// Fields of the onboarding form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BodyDetailsField {
    /// Years, see [`AGE_RANGE`].
    Age,
    /// Kilograms, see [`WEIGHT_RANGE`].
    Weight,
    /// Centimetres, see [`HEIGHT_RANGE`].
    Height,
    /// `M` or `F`, seeded to `M`.
    Gender,
    /// `L` or `G`, seeded to `L`.
    Goal,
}

impl FormField for BodyDetailsField {
    fn all() -> &'static [Self] {
        &[
            BodyDetailsField::Age,
            BodyDetailsField::Weight,
            BodyDetailsField::Height,
            BodyDetailsField::Gender,
            BodyDetailsField::Goal,
        ]
    }

    fn validate(self, value: &str, _form: &FormState<Self>) -> Option<String> {
        match self {
            BodyDetailsField::Age => {
                form::number_in_range("Age", value, AGE_RANGE.0, AGE_RANGE.1, Some(1.0))
            }
            BodyDetailsField::Weight => {
                form::number_in_range("Weight", value, WEIGHT_RANGE.0, WEIGHT_RANGE.1, Some(0.5))
            }
            BodyDetailsField::Height => {
                form::number_in_range("Height", value, HEIGHT_RANGE.0, HEIGHT_RANGE.1, Some(1.0))
            }
            BodyDetailsField::Gender => value
                .parse::<Gender>()
                .err()
                .map(|_| "Please select a gender".to_string()),
            BodyDetailsField::Goal => value
                .parse::<Goal>()
                .err()
                .map(|_| "Please select a goal".to_string()),
        }
    }
}

/// Onboarding form. Reachable only with a valid session and no stored body details.
pub struct BodyDetailsScreen {
    form: FormState<BodyDetailsField>,
    loading: bool,
    logging_out: bool,
    gate: SessionGate,
}

impl BodyDetailsScreen {
    /// Fresh form with gender and goal seeded.
    pub fn new(ctx: &ScreenContext) -> Self {
        let mut form = FormState::new();
        form.seed(BodyDetailsField::Gender, Gender::default().as_wire());
        form.seed(BodyDetailsField::Goal, Goal::default().as_wire());
        Self {
            form,
            loading: false,
            logging_out: false,
            gate: SessionGate::new(Route::AddBodyDetails, ctx.session_rule),
        }
    }

    /// Values and errors.
    pub fn form(&self) -> &FormState<BodyDetailsField> {
        &self.form
    }

    /// Mount-time checks.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Whether a submit is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a logout is pending.
    pub fn is_logging_out(&self) -> bool {
        self.logging_out
    }

    /// Store a value and return its validation error, if any.
    pub fn set_field(
        &mut self,
        field: BodyDetailsField,
        value: impl Into<String>,
    ) -> Option<&str> {
        self.form.set(field, value)
    }

    /// Run the gate. Skipped when arriving from Login.
    pub async fn mount(&mut self, ctx: &ScreenContext, incoming: Option<Reason>) -> GateDecision {
        self.gate.mount(&ctx.api, ctx.notifier(), incoming).await
    }

    /// Parsed form values; `None` until every field validates.
    pub fn details(&self) -> Option<BodyDetails> {
        let number = |field| self.form.value(field).trim().parse::<f64>().ok();
        Some(BodyDetails {
            age: number(BodyDetailsField::Age)? as u32,
            weight: number(BodyDetailsField::Weight)?,
            height: number(BodyDetailsField::Height)? as u32,
            gender: self.form.value(BodyDetailsField::Gender).parse().ok()?,
            goal: self.form.value(BodyDetailsField::Goal).parse().ok()?,
        })
    }

    /// Validate and send; on success go to Dashboard.
    pub async fn submit(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        if !self.form.validate_all() {
            return SubmitOutcome::Invalid;
        }
        let Some(details) = self.details() else {
            return SubmitOutcome::Invalid;
        };

        self.loading = true;
        let call = ctx.api.add_body_details(&details);
        let outcome = match send(ctx.notifier(), "add_body_details", call).await {
            Ok(_) => {
                ctx.notifier().success(BODY_DETAILS_SUCCESS_MESSAGE);
                SubmitOutcome::Navigate(NavigationIntent::new(
                    Route::Dashboard,
                    Reason::AddBodyDetails,
                ))
            }
            Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
        };
        self.loading = false;
        outcome
    }

    /// End the session and return to Login.
    pub async fn logout(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        super::logout(ctx, &mut self.logging_out, Route::AddBodyDetails).await
    }
}
