use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::api::{monthly_logs_value, net_caloric_balance_value};
use crate::envelope::GENERIC_FAILURE_MESSAGE;
use crate::gate::{GateDecision, SessionGate};
use crate::model::{month_of_key, Goal, LogEntry, MonthlyLogs};
use crate::navigation::{Reason, Route};

use super::{
    conflict_to_global, send, CreateLogScreen, LogListScreen, ScreenContext, SubmitOutcome,
};

/// Rendered when there are no month tiles.
pub const NO_LOGS_PLACEHOLDER: &str = "No logs exist";
/// Shown after the weight goal changes.
pub const GOAL_UPDATED_MESSAGE: &str = "Weight goal updated.";

/// One month on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthTile {
    /// Month label, e.g. `October, 2024`.
    pub label: String,
    /// Days logged in the month.
    pub entries: Vec<LogEntry>,
}

/// Home screen: net caloric balance, one tile per month, and the create-log dialog.
pub struct DashboardScreen {
    gate: SessionGate,
    balance: Option<f64>,
    logs: Option<MonthlyLogs>,
    logging_out: bool,
    saving_goal: bool,
    create_log: Option<CreateLogScreen>,
}

impl DashboardScreen {
    /// Screen with nothing loaded.
    pub fn new(ctx: &ScreenContext) -> Self {
        Self {
            gate: SessionGate::new(Route::Dashboard, ctx.session_rule),
            balance: None,
            logs: None,
            logging_out: false,
            saving_goal: false,
            create_log: None,
        }
    }

    /// Mount-time checks.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Last loaded net caloric balance.
    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    /// Last loaded logs.
    pub fn logs(&self) -> Option<&MonthlyLogs> {
        self.logs.as_ref()
    }

    /// Whether a goal change is pending.
    pub fn is_saving_goal(&self) -> bool {
        self.saving_goal
    }

    /// Whether a logout is pending.
    pub fn is_logging_out(&self) -> bool {
        self.logging_out
    }

    /// Gate and data loads run side by side; either load may fail without affecting the
    /// other.
    pub async fn mount(&mut self, ctx: &ScreenContext, incoming: Option<Reason>) -> GateDecision {
        let (decision, (balance, logs)) = tokio::join!(
            self.gate.mount(&ctx.api, ctx.notifier(), incoming),
            load(ctx)
        );
        self.balance = balance;
        self.logs = logs;
        decision
    }

    /// Re-fetch balance and logs, e.g. after the create-log dialog closes.
    pub async fn refresh(&mut self, ctx: &ScreenContext) {
        let (balance, logs) = load(ctx).await;
        if balance.is_some() {
            self.balance = balance;
        }
        if logs.is_some() {
            self.logs = logs;
        }
    }

    /// Balance with an explicit sign, e.g. `+5000`.
    pub fn balance_text(&self) -> Option<String> {
        self.balance.map(format_balance)
    }

    /// Tiles in calendar order. Keys that do not name a month sort last, by label.
    pub fn tiles(&self) -> Vec<MonthTile> {
        let Some(logs) = &self.logs else {
            return Vec::new();
        };
        let mut tiles: Vec<MonthTile> = logs
            .iter()
            .map(|(label, entries)| MonthTile {
                label: label.clone(),
                entries: entries.clone(),
            })
            .collect();
        tiles.sort_by(|a, b| compare_months(&a.label, &b.label));
        tiles
    }

    /// Plain-text rendering used by the shell.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.balance_text() {
            Some(text) => out.push_str(&format!("NET CALORIC BALANCE: {text}\n")),
            None => out.push_str("NET CALORIC BALANCE: unavailable\n"),
        }
        let tiles = self.tiles();
        if tiles.is_empty() {
            out.push_str(NO_LOGS_PLACEHOLDER);
            out.push('\n');
            return out;
        }
        for tile in tiles {
            let done = tile.entries.iter().filter(|entry| entry.is_done()).count();
            out.push_str(&format!(
                "{} ({} days, {} done)\n",
                tile.label,
                tile.entries.len(),
                done
            ));
        }
        out
    }

    /// Log list for one tile.
    pub fn month(&self, label: &str) -> Option<LogListScreen> {
        let entries = self.logs.as_ref()?.get(label)?;
        Some(LogListScreen::new(label, entries.clone()))
    }

    /// Open the create-log dialog, replacing any open one.
    pub fn open_create_log(&mut self, today: NaiveDate) -> &mut CreateLogScreen {
        self.create_log.insert(CreateLogScreen::new(today))
    }

    /// The open dialog, if any.
    pub fn create_log(&mut self) -> Option<&mut CreateLogScreen> {
        self.create_log.as_mut()
    }

    /// Close the dialog without submitting.
    pub fn close_create_log(&mut self) {
        self.create_log = None;
    }

    /// Submit the open dialog; it closes and the data reloads when the log was created.
    pub async fn submit_create_log(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        let Some(dialog) = self.create_log.as_mut() else {
            return SubmitOutcome::Invalid;
        };
        let outcome = dialog.submit(ctx).await;
        if outcome == SubmitOutcome::Completed {
            self.close_create_log();
            self.refresh(ctx).await;
        }
        outcome
    }

    /// Change the weight goal and reload.
    pub async fn set_weight_goal(&mut self, ctx: &ScreenContext, goal: Goal) -> SubmitOutcome {
        self.saving_goal = true;
        let call = ctx.api.set_weight_goal(goal);
        let outcome = match send(ctx.notifier(), "set_weight_goal", call).await {
            Ok(_) => {
                ctx.notifier().success(GOAL_UPDATED_MESSAGE);
                self.refresh(ctx).await;
                SubmitOutcome::Completed
            }
            Err(outcome) => conflict_to_global(ctx.notifier(), outcome),
        };
        self.saving_goal = false;
        outcome
    }

    /// End the session and return to Login.
    pub async fn logout(&mut self, ctx: &ScreenContext) -> SubmitOutcome {
        super::logout(ctx, &mut self.logging_out, Route::Dashboard).await
    }
}

async fn load(ctx: &ScreenContext) -> (Option<f64>, Option<MonthlyLogs>) {
    let (balance, logs) = tokio::join!(ctx.api.net_caloric_balance(), ctx.api.logs());

    let balance = match balance {
        Ok(envelope) => net_caloric_balance_value(&envelope),
        Err(err) => {
            warn!(error = %err, "net caloric balance fetch failed");
            ctx.notifier().error(GENERIC_FAILURE_MESSAGE);
            None
        }
    };
    let logs = match logs {
        Ok(envelope) => monthly_logs_value(&envelope),
        Err(err) => {
            warn!(error = %err, "log fetch failed");
            ctx.notifier().error(GENERIC_FAILURE_MESSAGE);
            None
        }
    };
    debug!(
        balance = ?balance,
        months = logs.as_ref().map(|logs| logs.len()),
        "dashboard data loaded"
    );
    (balance, logs)
}

/// Positive values get a `+`; zero is plain `0`.
pub fn format_balance(value: f64) -> String {
    if value > 0.0 {
        format!("+{value}")
    } else if value < 0.0 {
        format!("{value}")
    } else {
        "0".to_string()
    }
}

fn compare_months(a: &str, b: &str) -> Ordering {
    match (month_of_key(a), month_of_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_signs() {
        assert_eq!(format_balance(5000.0), "+5000");
        assert_eq!(format_balance(-250.5), "-250.5");
        assert_eq!(format_balance(0.0), "0");
        assert_eq!(format_balance(-0.0), "0");
    }

    #[test]
    fn months_sort_by_calendar_not_name() {
        let mut keys = vec!["October, 2024", "January, 2025", "September, 2024", "misc"];
        keys.sort_by(|a, b| compare_months(a, b));
        assert_eq!(
            keys,
            vec!["September, 2024", "October, 2024", "January, 2025", "misc"]
        );
    }
}
