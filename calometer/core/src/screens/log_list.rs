use chrono::NaiveDate;

use crate::form::{self, FormField, FormState};
use crate::model::{log_date_to_wire, CalorieUpdate, LogEntry, LogStatus};

use super::{conflict_to_global, send, ScreenContext, SubmitOutcome};

/// Shown after calories are added.
pub const LOG_UPDATED_MESSAGE: &str = "Log has been updated.";
/// Shown after a day is removed.
pub const LOG_DELETED_MESSAGE: &str = "Log has been deleted.";
/// Shown after a status change.
pub const LOG_STATUS_MESSAGE: &str = "Log status has been updated.";

/// Amounts added to a day's totals. Negative values correct an earlier entry; the backend
/// refuses totals below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CalorieField {
    /// Calories eaten.
    Consumed,
    /// Calories spent.
    Burnt,
}

impl FormField for CalorieField {
    fn all() -> &'static [Self] {
        &[CalorieField::Consumed, CalorieField::Burnt]
    }

    fn validate(self, value: &str, _form: &FormState<Self>) -> Option<String> {
        let label = match self {
            CalorieField::Consumed => "Calories consumed",
            CalorieField::Burnt => "Calories burnt",
        };
        if value.trim().is_empty() {
            return None;
        }
        form::number_in_range(label, value, f64::MIN, f64::MAX, None)
    }
}

/// The days of one month, with per-day update, status and delete actions.
pub struct LogListScreen {
    label: String,
    entries: Vec<LogEntry>,
    form: FormState<CalorieField>,
    loading: bool,
}

impl LogListScreen {
    /// Screen for the month `label`, days in date order.
    pub fn new(label: impl Into<String>, mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by_key(|entry| entry.date());
        Self {
            label: label.into(),
            entries,
            form: FormState::new(),
            loading: false,
        }
    }

    /// Month label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Days of the month as last confirmed by the backend.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Calorie form shared by every day's update.
    pub fn form(&self) -> &FormState<CalorieField> {
        &self.form
    }

    /// Whether an action is pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Store a value and return its validation error, if any.
    pub fn set_field(&mut self, field: CalorieField, value: impl Into<String>) -> Option<&str> {
        self.form.set(field, value)
    }

    /// Blank amounts count as zero.
    fn amount(&self, field: CalorieField) -> f64 {
        self.form.value(field).trim().parse().unwrap_or(0.0)
    }

    /// Add the form's calories to `date`. Blank fields count as zero.
    pub async fn update(&mut self, ctx: &ScreenContext, date: NaiveDate) -> SubmitOutcome {
        if !self.form.validate_all() {
            return SubmitOutcome::Invalid;
        }
        let update = CalorieUpdate {
            log_date: log_date_to_wire(date),
            calories_consumed: self.amount(CalorieField::Consumed),
            calories_burnt: self.amount(CalorieField::Burnt),
        };

        self.loading = true;
        let outcome = match send(ctx.notifier(), "update_log", ctx.api.update_log(&update)).await {
            Ok(_) => {
                ctx.notifier().success(LOG_UPDATED_MESSAGE);
                if let Some(entry) = self.entry_mut(date) {
                    entry.calories_consumed += update.calories_consumed;
                    entry.calories_burnt += update.calories_burnt;
                }
                self.form = FormState::new();
                SubmitOutcome::Completed
            }
            Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
        };
        self.loading = false;
        outcome
    }

    /// Set the status letter of `date`.
    pub async fn mark_status(
        &mut self,
        ctx: &ScreenContext,
        date: NaiveDate,
        status: LogStatus,
    ) -> SubmitOutcome {
        self.loading = true;
        let call = ctx.api.mark_log_status(date, status);
        let outcome = match send(ctx.notifier(), "mark_log_status", call).await {
            Ok(_) => {
                ctx.notifier().success(LOG_STATUS_MESSAGE);
                if let Some(entry) = self.entry_mut(date) {
                    entry.log_status = status.as_wire().to_string();
                }
                SubmitOutcome::Completed
            }
            Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
        };
        self.loading = false;
        outcome
    }

    /// Remove the log of `date`.
    pub async fn delete(&mut self, ctx: &ScreenContext, date: NaiveDate) -> SubmitOutcome {
        self.loading = true;
        let outcome = match send(ctx.notifier(), "delete_log", ctx.api.delete_log(date)).await {
            Ok(_) => {
                ctx.notifier().success(LOG_DELETED_MESSAGE);
                self.entries.retain(|entry| entry.date() != Some(date));
                SubmitOutcome::Completed
            }
            Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
        };
        self.loading = false;
        outcome
    }

    fn entry_mut(&mut self, date: NaiveDate) -> Option<&mut LogEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.date() == Some(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str) -> LogEntry {
        LogEntry {
            log_date: date.to_string(),
            calories_burnt: 0.0,
            calories_consumed: 0.0,
            tdee: 2000.0,
            updated_at: String::new(),
            log_status: "I".to_string(),
        }
    }

    #[test]
    fn entries_sorted_by_day() {
        let screen = LogListScreen::new(
            "October, 2024",
            vec![entry("2024-10-03T00:00:00Z"), entry("2024-10-01T00:00:00Z")],
        );
        assert_eq!(screen.entries()[0].log_date, "2024-10-01T00:00:00Z");
    }

    #[test]
    fn amounts_must_be_numbers_when_given() {
        let mut screen = LogListScreen::new("October, 2024", Vec::new());
        assert_eq!(screen.set_field(CalorieField::Consumed, "350"), None);
        assert_eq!(screen.set_field(CalorieField::Burnt, ""), None);
        assert_eq!(
            screen.set_field(CalorieField::Burnt, "lots"),
            Some("Calories burnt must be a number")
        );
    }
}
