//! Client core for the calorie tracking backend.
//!
//! Every backend call goes through one normalizer ([`CalometerApi::call`]) that turns the raw
//! HTTP answer into an [`Envelope`]. Screens are headless state machines: a [`SessionGate`]
//! decides at mount time whether a screen renders or redirects, and forms validate locally
//! before anything reaches the network. User-facing messages go through an injected
//! [`Notifier`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod form;
pub mod gate;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod screens;
pub mod transport;

pub use api::CalometerApi;
pub use config::ClientConfig;
pub use envelope::{AppCode, Envelope, Outcome, GENERIC_FAILURE_MESSAGE};
pub use error::{ConfigError, TransportError};
pub use form::{FormField, FormState};
pub use gate::{GateDecision, GateState, SessionGate, SessionRule};
pub use navigation::{NavigationIntent, Navigator, Reason, Route};
pub use notify::{Level, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use screens::{ScreenContext, SubmitOutcome};
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport};
