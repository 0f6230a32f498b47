//! Uniform result of a backend call.
//!
//! The backend answers every request with `{"code": {"<status>": "<message>"}, "data": ...}`.
//! The single-key mapping is an encoding detail of the wire format, so it is translated here into
//! a plain [`AppCode`] pair and never leaks past this module.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Application status codes the backend places in the `code` mapping.
pub mod codes {
    /// Success.
    pub const OK: u16 = 200;
    /// Malformed or invalid request.
    pub const BAD_REQUEST: u16 = 400;
    /// No valid session.
    pub const UNAUTHORIZED: u16 = 401;
    /// The request collides with existing state (taken username, completed log).
    pub const CONFLICT: u16 = 409;
    /// Backend failure.
    pub const INTERNAL: u16 = 500;
}

/// Shown whenever an outcome cannot be attributed to a server message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again.";

/// Application status and the message that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCode {
    /// Status from the `code` mapping key, see [`codes`].
    pub code: u16,
    /// Human-readable text from the mapping value.
    pub message: String,
}

impl AppCode {
    /// Pair a status with its message.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the status is 200.
    pub fn is_ok(&self) -> bool {
        self.code == codes::OK
    }
}

/// Transport metadata plus the decoded application result.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// HTTP status line code, independent of the application code.
    pub http_code: u16,
    /// Whether the client followed a redirect to get here.
    pub redirected: bool,
    /// Response headers.
    pub headers: HeaderMap,
    /// `None` when the body was absent, not JSON, or carried no usable code.
    pub app: Option<AppCode>,
    /// The `data` member; `None` when absent or null.
    pub data: Option<Value>,
}

/// How a caller should branch on an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// Application code 200.
    Ok,
    /// 409 with the server message.
    Conflict(&'a str),
    /// 401 with the server message.
    Unauthorized(&'a str),
    /// Any other code.
    Failed {
        /// Application status.
        code: u16,
        /// Server message.
        message: &'a str,
    },
    /// No application code could be read.
    Unknown,
}

impl Envelope {
    /// Build an envelope from a finished HTTP exchange. Never fails: a body that cannot be
    /// decoded yields `app == None` with the transport fields still populated.
    pub fn from_parts(http_code: u16, redirected: bool, headers: HeaderMap, body: &[u8]) -> Self {
        let mut envelope = Self {
            http_code,
            redirected,
            headers,
            app: None,
            data: None,
        };

        let parsed: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                warn!(http_code, error = %err, "response body is not json");
                return envelope;
            }
        };

        if let Value::Object(mut fields) = parsed {
            envelope.app = fields.get("code").and_then(app_code_from_wire);
            envelope.data = fields.remove("data").filter(|value| !value.is_null());
        }
        envelope
    }

    /// Application status, if one was decoded.
    pub fn app_code(&self) -> Option<u16> {
        self.app.as_ref().map(|app| app.code)
    }

    /// Server message, if one was decoded.
    pub fn message(&self) -> Option<&str> {
        self.app.as_ref().map(|app| app.message.as_str())
    }

    /// Whether the application code is 200.
    pub fn is_ok(&self) -> bool {
        self.app.as_ref().is_some_and(AppCode::is_ok)
    }

    /// Server message, or the generic failure text when there is none.
    pub fn message_or_generic(&self) -> &str {
        self.message()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
    }

    /// Classify for branching.
    pub fn outcome(&self) -> Outcome<'_> {
        match &self.app {
            None => Outcome::Unknown,
            Some(app) => match app.code {
                codes::OK => Outcome::Ok,
                codes::CONFLICT => Outcome::Conflict(&app.message),
                codes::UNAUTHORIZED => Outcome::Unauthorized(&app.message),
                code => Outcome::Failed {
                    code,
                    message: &app.message,
                },
            },
        }
    }

    /// Decode `data` into a typed payload; `None` when absent or shaped differently.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        let data = self.data.as_ref()?;
        match serde_json::from_value(data.clone()) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(error = %err, "response data has unexpected shape");
                None
            }
        }
    }
}

/// Translate the `{"<status>": "<message>"}` mapping. The backend sends exactly one entry; if
/// more ever arrive the lowest numeric status wins so the result stays deterministic.
fn app_code_from_wire(code: &Value) -> Option<AppCode> {
    let entries = code.as_object()?;
    entries
        .iter()
        .filter_map(|(key, message)| {
            let status = key.trim().parse::<u16>().ok()?;
            let message = match message {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Some(AppCode::new(status, message))
        })
        .min_by_key(|app| app.code)
}
