//! Request and response payloads exchanged with the backend.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Body of `/api/users/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    /// Full name.
    pub name: String,
    /// Login name; must be unused.
    pub username: String,
    /// Plain password, at least six characters.
    pub password: String,
}

/// Body of `/api/users/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plain password.
    pub password: String,
}

/// Sent as `M` or `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    /// `M`
    #[default]
    #[serde(rename = "M")]
    Male,
    /// `F`
    #[serde(rename = "F")]
    Female,
}

/// Weight goal, sent as `L` or `G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Goal {
    /// `L`
    #[default]
    #[serde(rename = "L")]
    Lose,
    /// `G`
    #[serde(rename = "G")]
    Gain,
}

/// Status of a day's log, sent as `D` or `I`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    /// `D`: the day is closed and refuses further updates.
    #[serde(rename = "D")]
    Done,
    /// `I`
    #[serde(rename = "I")]
    InProgress,
}

macro_rules! wire_letter {
    ($ty:ty, $what:literal, { $($letter:literal => $variant:path),+ $(,)? }) => {
        impl $ty {
            /// Single-letter wire form.
            pub fn as_wire(self) -> &'static str {
                match self {
                    $($variant => $letter,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_uppercase().as_str() {
                    $($letter => Ok($variant),)+
                    other => Err(format!("unknown {} `{other}`", $what)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_wire())
            }
        }
    };
}

wire_letter!(Gender, "gender", { "M" => Gender::Male, "F" => Gender::Female });
wire_letter!(Goal, "goal", { "L" => Goal::Lose, "G" => Goal::Gain });
wire_letter!(LogStatus, "log status", { "D" => LogStatus::Done, "I" => LogStatus::InProgress });

/// Body of `/api/users/body_details/add`. Weight in kilograms, height in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyDetails {
    /// Whole years.
    pub age: u32,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: u32,
    /// Used by the backend's energy estimate.
    pub gender: Gender,
    /// Lose or gain.
    pub goal: Goal,
}

/// Body of `/api/users/log/update`. Values are added to the day's running totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieUpdate {
    /// Wire date, see [`log_date_to_wire`].
    pub log_date: String,
    /// Added to the day's consumed total.
    pub calories_consumed: f64,
    /// Added to the day's burnt total.
    pub calories_burnt: f64,
}

/// One day of the calorie log. Accepts camelCase keys as well as the capitalised keys emitted
/// by older backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Day of the log as the backend sent it.
    #[serde(alias = "LogDate", alias = "log_date")]
    pub log_date: String,
    /// Running total burnt.
    #[serde(default, alias = "CaloriesBurnt", alias = "calories_burnt")]
    pub calories_burnt: f64,
    /// Running total consumed.
    #[serde(default, alias = "CaloriesConsumed", alias = "calories_consumed")]
    pub calories_consumed: f64,
    /// Total daily energy expenditure for the day.
    #[serde(default, alias = "Tdee")]
    pub tdee: f64,
    /// Last change, as the backend sent it.
    #[serde(default, alias = "Updated_at", alias = "UpdatedAt", alias = "updated_at")]
    pub updated_at: String,
    /// Status letter, see [`LogStatus`].
    #[serde(default, alias = "LogStatus", alias = "log_status")]
    pub log_status: String,
}

impl LogEntry {
    /// Parsed [`Self::log_date`].
    pub fn date(&self) -> Option<NaiveDate> {
        parse_log_date(&self.log_date)
    }

    /// Whether the status letter is `D`.
    pub fn is_done(&self) -> bool {
        self.log_status.parse::<LogStatus>() == Ok(LogStatus::Done)
    }
}

/// Logs keyed by month label.
pub type MonthlyLogs = BTreeMap<String, Vec<LogEntry>>;

/// `data` of `/api/users/body_details/exists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BodyDetailsExists {
    /// Whether onboarding is complete.
    pub exists: bool,
}

/// `data` of `/api/users/net_caloric_balance/get`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NetCaloricBalance {
    /// Consumed minus burnt over every log; negative is a deficit.
    pub net_caloric_balance: f64,
}

/// `data` of `/api/users/log/get`: either already grouped by month or a flat list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsPayload {
    /// Grouped form.
    #[serde(default)]
    pub monthly_logs: Option<MonthlyLogs>,
    /// Flat form.
    #[serde(default)]
    pub logs: Option<Vec<LogEntry>>,
}

impl LogsPayload {
    /// Grouped logs; a flat list is grouped by [`month_label`].
    pub fn into_monthly(self) -> MonthlyLogs {
        if let Some(monthly) = self.monthly_logs {
            return monthly;
        }
        let mut grouped = MonthlyLogs::new();
        for entry in self.logs.unwrap_or_default() {
            let label = entry
                .date()
                .map(month_label)
                .unwrap_or_else(|| entry.log_date.clone());
            grouped.entry(label).or_default().push(entry);
        }
        grouped
    }
}

/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps. The day of a timestamp is taken in
/// its own offset. Anything else, including trailing text after a date, is rejected.
pub fn parse_log_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|stamp| stamp.date_naive()))
}

/// Wire form of a log date: midnight UTC, millisecond precision (`2024-10-01T00:00:00.000Z`).
pub fn log_date_to_wire(date: NaiveDate) -> String {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&midnight)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Tile heading for a month, e.g. `September, 2024`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B, %Y").to_string()
}

/// Calendar position of a month key. Keys may be `September, 2024`, `2024-09`, or a full date.
pub fn month_of_key(key: &str) -> Option<(i32, u32)> {
    let key = key.trim();
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {key}"), "%d %B, %Y") {
        return Some((date.year(), date.month()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d") {
        return Some((date.year(), date.month()));
    }
    parse_log_date(key).map(|date| (date.year(), date.month()))
}
