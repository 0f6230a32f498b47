//! User-facing notifications, injected into screens instead of a global toast queue.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// An action went through.
    Success,
    /// An action failed.
    Error,
}

/// One message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Text as shown.
    pub message: String,
}

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Show `message` at `level`.
    fn notify(&self, level: Level, message: &str);

    /// Shorthand for [`Level::Success`].
    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    /// Shorthand for [`Level::Error`].
    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success => info!(text = message, "notification"),
            Level::Error => warn!(text = message, "notification"),
        }
    }
}

/// Keeps every notification in order; the shell drains it after each action.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Everything recorded so far, leaving the recorder empty.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Error messages in order.
    pub fn errors(&self) -> Vec<String> {
        self.messages(Level::Error)
    }

    /// Success messages in order.
    pub fn successes(&self) -> Vec<String> {
        self.messages(Level::Success)
    }

    fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        TracingNotifier.notify(level, message);
        self.entries.lock().push(Notification {
            level,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order_and_drains() {
        let notifier = RecordingNotifier::new();
        notifier.success("Login successful");
        notifier.error("Username or password is incorrect.");

        assert_eq!(notifier.successes(), vec!["Login successful"]);
        assert_eq!(notifier.errors(), vec!["Username or password is incorrect."]);
        assert_eq!(notifier.drain().len(), 2);
        assert!(notifier.snapshot().is_empty());
    }
}
