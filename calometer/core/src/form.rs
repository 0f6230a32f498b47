//! Local form state and field validators shared by every form screen.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::parse_log_date;

/// A field of some form. `validate` sees the whole form so cross-field rules (password
/// confirmation) can be expressed.
pub trait FormField: Copy + Ord + std::fmt::Debug + 'static {
    /// Every field, in submit-validation order.
    fn all() -> &'static [Self];
    /// Error message for `value`, or `None` when it is acceptable.
    fn validate(self, value: &str, form: &FormState<Self>) -> Option<String>;
}

/// Field values plus a parallel map of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState<K: Ord> {
    values: BTreeMap<K, String>,
    errors: BTreeMap<K, String>,
}

impl<K: Ord> Default for FormState<K> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

impl<K: FormField> FormState<K> {
    /// Empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value; blank when never set.
    pub fn value(&self, field: K) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Current error of one field.
    pub fn error(&self, field: K) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// All current errors.
    pub fn errors(&self) -> &BTreeMap<K, String> {
        &self.errors
    }

    /// Whether any field has an error.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Store a value without validating it; used to seed defaults.
    pub fn seed(&mut self, field: K, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Change handler: store the value and re-validate that one field.
    pub fn set(&mut self, field: K, value: impl Into<String>) -> Option<&str> {
        self.values.insert(field, value.into());
        self.revalidate(field);
        self.error(field)
    }

    /// Attach a server-side error (e.g. a 409 conflict) to one field.
    pub fn set_error(&mut self, field: K, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// Submit-time validation of every field. Returns `true` when the form may be sent.
    pub fn validate_all(&mut self) -> bool {
        self.errors.clear();
        for &field in K::all() {
            self.revalidate(field);
        }
        self.errors.is_empty()
    }

    fn revalidate(&mut self, field: K) {
        match field.validate(self.value(field), self) {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

/// Validation messages, shown verbatim.
pub mod messages {
    /// Blank full name.
    pub const FULL_NAME_REQUIRED: &str = "Full name is required";
    /// Full name with digits or symbols.
    pub const FULL_NAME_LETTERS: &str = "Full name must contain only letters";
    /// Blank username.
    pub const USERNAME_REQUIRED: &str = "Username is required";
    /// Blank password.
    pub const PASSWORD_REQUIRED: &str = "Password is required";
    /// Password under [`MIN_PASSWORD_LEN`](super::MIN_PASSWORD_LEN).
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
    /// Blank confirmation.
    pub const CONFIRM_REQUIRED: &str = "Confirm password is required";
    /// Confirmation differs from the password.
    pub const PASSWORDS_MISMATCH: &str = "Passwords do not match";
    /// Not a `YYYY-MM-DD` date.
    pub const LOG_DATE_INVALID: &str = "Please pick a valid date";
    /// Date after today.
    pub const LOG_DATE_FUTURE: &str = "Log date cannot be a future date.";
}

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// `message` when `value` is blank after trimming.
pub fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

/// Required; ASCII letters and whitespace only.
pub fn full_name(value: &str) -> Option<String> {
    required(value, messages::FULL_NAME_REQUIRED).or_else(|| {
        let letters_only = value
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace());
        (!letters_only).then(|| messages::FULL_NAME_LETTERS.to_string())
    })
}

/// Required.
pub fn username(value: &str) -> Option<String> {
    required(value, messages::USERNAME_REQUIRED)
}

/// Blank check trims; the length check counts the raw value.
pub fn password(value: &str) -> Option<String> {
    required(value, messages::PASSWORD_REQUIRED).or_else(|| {
        (value.chars().count() < MIN_PASSWORD_LEN)
            .then(|| messages::PASSWORD_TOO_SHORT.to_string())
    })
}

/// Exact, case-sensitive comparison; no trimming.
pub fn confirm_password(value: &str, password: &str) -> Option<String> {
    required(value, messages::CONFIRM_REQUIRED)
        .or_else(|| (value != password).then(|| messages::PASSWORDS_MISMATCH.to_string()))
}

/// Numeric field within `min..=max`, on a grid of `step` when one is given.
pub fn number_in_range(
    label: &str,
    value: &str,
    min: f64,
    max: f64,
    step: Option<f64>,
) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{label} is required"));
    }
    let Ok(parsed) = value.trim().parse::<f64>() else {
        return Some(format!("{label} must be a number"));
    };
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Some(format!("{label} must be between {min} and {max}"));
    }
    if let Some(step) = step {
        let steps = (parsed - min) / step;
        if (steps - steps.round()).abs() > 1e-9 {
            return Some(format!("{label} must be a multiple of {step}"));
        }
    }
    None
}

/// A parseable date no later than `today`.
pub fn log_date(value: &str, today: NaiveDate) -> Option<String> {
    match parse_log_date(value) {
        None => Some(messages::LOG_DATE_INVALID.to_string()),
        Some(date) if date > today => Some(messages::LOG_DATE_FUTURE.to_string()),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn password_rules() {
        assert_eq!(password("").as_deref(), Some(messages::PASSWORD_REQUIRED));
        assert_eq!(password("   ").as_deref(), Some(messages::PASSWORD_REQUIRED));
        assert_eq!(password("abc12").as_deref(), Some(messages::PASSWORD_TOO_SHORT));
        assert_eq!(password("abc123"), None);
    }

    #[test]
    fn confirmation_is_exact() {
        assert_eq!(confirm_password("secret1", "secret1"), None);
        assert_eq!(
            confirm_password("Secret1", "secret1").as_deref(),
            Some(messages::PASSWORDS_MISMATCH)
        );
        assert_eq!(
            confirm_password("secret1 ", "secret1").as_deref(),
            Some(messages::PASSWORDS_MISMATCH)
        );
        assert_eq!(
            confirm_password("", "secret1").as_deref(),
            Some(messages::CONFIRM_REQUIRED)
        );
    }

    #[test]
    fn full_name_letters_and_spaces() {
        assert_eq!(full_name("Ada Lovelace"), None);
        assert_eq!(
            full_name("R2 D2").as_deref(),
            Some(messages::FULL_NAME_LETTERS)
        );
    }

    #[test]
    fn ranges_and_steps() {
        assert_eq!(number_in_range("Weight", "72.5", 40.0, 150.0, Some(0.5)), None);
        assert!(number_in_range("Weight", "72.3", 40.0, 150.0, Some(0.5)).is_some());
        assert!(number_in_range("Age", "19", 20.0, 54.0, Some(1.0)).is_some());
        assert!(number_in_range("Age", "thirty", 20.0, 54.0, Some(1.0)).is_some());
        assert_eq!(
            number_in_range("Age", "", 20.0, 54.0, None).as_deref(),
            Some("Age is required")
        );
    }

    #[test]
    fn future_dates_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
        assert_eq!(log_date("2024-10-15", today), None);
        assert_eq!(
            log_date("2024-10-16", today).as_deref(),
            Some(messages::LOG_DATE_FUTURE)
        );
        assert_eq!(
            log_date("15/10/2024", today).as_deref(),
            Some(messages::LOG_DATE_INVALID)
        );
        assert_eq!(
            log_date("2024-10-01oops", today).as_deref(),
            Some(messages::LOG_DATE_INVALID)
        );
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Pair {
        First,
        Second,
    }

    impl FormField for Pair {
        fn all() -> &'static [Self] {
            &[Pair::First, Pair::Second]
        }

        fn validate(self, value: &str, form: &FormState<Self>) -> Option<String> {
            match self {
                Pair::First => required(value, "First is required"),
                Pair::Second => confirm_password(value, form.value(Pair::First)),
            }
        }
    }

    #[test]
    fn validate_all_walks_every_field() {
        let mut form = FormState::<Pair>::new();
        assert!(!form.validate_all());
        assert_eq!(form.error(Pair::First), Some("First is required"));

        form.set(Pair::First, "secret1");
        form.set(Pair::Second, "secret2");
        assert!(!form.validate_all());
        assert_eq!(form.error(Pair::First), None);
        assert_eq!(form.error(Pair::Second), Some(messages::PASSWORDS_MISMATCH));

        form.set(Pair::Second, "secret1");
        assert!(form.validate_all());
    }

    proptest! {
        #[test]
        fn validators_are_idempotent(value in ".{0,24}", other in ".{0,24}") {
            prop_assert_eq!(full_name(&value), full_name(&value));
            prop_assert_eq!(username(&value), username(&value));
            prop_assert_eq!(password(&value), password(&value));
            prop_assert_eq!(confirm_password(&value, &other), confirm_password(&value, &other));
        }

        #[test]
        fn mismatch_iff_different(value in "[a-zA-Z0-9 ]{1,12}", other in "[a-zA-Z0-9 ]{1,12}") {
            prop_assume!(!value.trim().is_empty());
            let flagged = confirm_password(&value, &other).as_deref() == Some(messages::PASSWORDS_MISMATCH);
            prop_assert_eq!(flagged, value != other);
        }
    }
}
