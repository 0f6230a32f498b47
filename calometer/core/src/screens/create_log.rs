use chrono::NaiveDate;

use crate::form::{self, FormField, FormState};
use crate::model::parse_log_date;

use super::{send, ScreenContext, SubmitOutcome};

/// Shown after the log is created.
pub const CREATE_LOG_SUCCESS_MESSAGE: &str = "Log has been created.";

/// Fields of the create-log dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreateLogField {
    /// `YYYY-MM-DD`, today or earlier.
    LogDate,
}

/// The form needs "today" to reject future dates, so validation goes through the screen.
impl FormField for CreateLogField {
    fn all() -> &'static [Self] {
        &[CreateLogField::LogDate]
    }

    fn validate(self, value: &str, _form: &FormState<Self>) -> Option<String> {
        parse_log_date(value)
            .is_none()
            .then(|| form::messages::LOG_DATE_INVALID.to_string())
    }
}

/// Dialog opened from the dashboard to start a new day's log.
pub struct CreateLogScreen {
    form: FormState<CreateLogField>,
    loading: bool,
    today: NaiveDate,
}

impl CreateLogScreen {
    /// Dialog with the date seeded to `today`.
    pub fn new(today: NaiveDate) -> Self {
        let mut form = FormState::new();
        form.seed(CreateLogField::LogDate, today.format("%Y-%m-%d").to_string());
        Self {
            form,
            loading: false,
            today,
        }
    }

    /// Values and errors.
    pub fn form(&self) -> &FormState<CreateLogField> {
        &self.form
    }

    /// Whether a submit is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Store the date and return its validation error, if any.
    pub fn set_date(&mut self, value: impl Into<String>) -> Option<&str> {
        self.form.set(CreateLogField::LogDate, value);
        self.check_future();
        self.form.error(CreateLogField::LogDate)
    }

    fn check_future(&mut self) {
        let value = self.form.value(CreateLogField::LogDate);
        if let Some(message) = form::log_date(value, self.today) {
            self.form.set_error(CreateLogField::LogDate, message);
        }
    }

    /// Validate and send. A day that already has a log is a field error.
    pub async fn submit(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        self.form.validate_all();
        self.check_future();
        if self.form.has_errors() {
            return SubmitOutcome::Invalid;
        }
        let Some(date) = parse_log_date(self.form.value(CreateLogField::LogDate)) else {
            return SubmitOutcome::Invalid;
        };

        self.loading = true;
        let outcome = match send(ctx.notifier(), "create_log", ctx.api.create_log(date)).await {
            Ok(_) => {
                ctx.notifier().success(CREATE_LOG_SUCCESS_MESSAGE);
                SubmitOutcome::Completed
            }
            Err(SubmitOutcome::Conflict(message)) => {
                self.form.set_error(CreateLogField::LogDate, message.clone());
                SubmitOutcome::Conflict(message)
            }
            Err(outcome) => outcome,
        };
        self.loading = false;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_today_and_rejects_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
        let mut screen = CreateLogScreen::new(today);
        assert_eq!(screen.form().value(CreateLogField::LogDate), "2024-10-15");

        assert_eq!(
            screen.set_date("2024-10-16"),
            Some(form::messages::LOG_DATE_FUTURE)
        );
        assert_eq!(screen.set_date("2024-10-01"), None);
        assert_eq!(
            screen.set_date("not a date"),
            Some(form::messages::LOG_DATE_INVALID)
        );
    }
}
