//! Typed wrappers over the backend endpoints. Every call goes through [`CalometerApi::call`],
//! which is the response normalizer: transport in, [`Envelope`] out.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::envelope::Envelope;
use crate::error::TransportError;
use crate::model::{
    log_date_to_wire, BodyDetails, BodyDetailsExists, CalorieUpdate, Credentials, Goal,
    LogStatus, LogsPayload, MonthlyLogs, NetCaloricBalance, SignupRequest,
};
use crate::transport::{ApiRequest, Method, Transport};

/// Endpoint paths, relative to the configured origin.
pub mod paths {
    /// `POST`: create an account.
    pub const SIGNUP: &str = "/api/users/signup";
    /// `POST`: log in, or probe the session with an empty body.
    pub const LOGIN: &str = "/api/users/login";
    /// `POST`: end the session.
    pub const LOGOUT: &str = "/api/users/logout";
    /// `POST`: record body details.
    pub const BODY_DETAILS_ADD: &str = "/api/users/body_details/add";
    /// `GET`: whether body details are on file.
    pub const BODY_DETAILS_EXISTS: &str = "/api/users/body_details/exists";
    /// `GET`: net caloric balance.
    pub const NET_CALORIC_BALANCE: &str = "/api/users/net_caloric_balance/get";
    /// `GET`: logs grouped by month.
    pub const LOG_GET: &str = "/api/users/log/get";
    /// `POST`: start a day's log.
    pub const LOG_CREATE: &str = "/api/users/log/create";
    /// `PUT`: add calories to a day.
    pub const LOG_UPDATE: &str = "/api/users/log/update";
    /// `POST`: set a day's status letter.
    pub const LOG_MARK_STATUS: &str = "/api/users/log/mark_status";
    /// `DELETE`: remove a day's log.
    pub const LOG_DELETE: &str = "/api/users/log/delete";
    /// `POST`: change the weight goal.
    pub const SET_WEIGHT_GOAL: &str = "/api/users/set_weight_goal";
}

/// Typed endpoint calls over a shared [`Transport`].
#[derive(Clone)]
pub struct CalometerApi {
    transport: Arc<dyn Transport>,
}

impl CalometerApi {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Perform a call and normalize the response. Transport failures are returned as errors;
    /// every completed exchange yields an envelope, whatever its body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope, TransportError> {
        let raw = self
            .transport
            .execute(ApiRequest::new(method, path, body))
            .await?;
        let envelope = Envelope::from_parts(raw.status, raw.redirected, raw.headers, &raw.body);
        debug!(
            method = method.as_str(),
            path,
            http_code = envelope.http_code,
            app_code = ?envelope.app_code(),
            "normalized response"
        );
        Ok(envelope)
    }

    /// `GET` without a body.
    pub async fn get(&self, path: &str) -> Result<Envelope, TransportError> {
        self.call(Method::Get, path, None).await
    }

    /// `POST` with a JSON body.
    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope, TransportError> {
        self.call(Method::Post, path, Some(serde_json::to_value(body)?))
            .await
    }

    /// `PUT` with a JSON body.
    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope, TransportError> {
        self.call(Method::Put, path, Some(serde_json::to_value(body)?))
            .await
    }

    /// `DELETE` with a JSON body.
    pub async fn delete<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope, TransportError> {
        self.call(Method::Delete, path, Some(serde_json::to_value(body)?))
            .await
    }

    /// Create an account. A taken username comes back as 409.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<Envelope, TransportError> {
        self.post(paths::SIGNUP, request).await
    }

    /// Log in; the session cookie lands in the transport's jar.
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Envelope, TransportError> {
        self.post(paths::LOGIN, credentials).await
    }

    /// Session probe: the login endpoint answers 200 to an empty body when the session cookie is
    /// still valid.
    pub async fn check_session(&self) -> Result<Envelope, TransportError> {
        self.post(paths::LOGIN, &json!({})).await
    }

    /// End the session.
    pub async fn logout(&self) -> Result<Envelope, TransportError> {
        self.post(paths::LOGOUT, &json!({})).await
    }

    /// Record age, weight, height, gender and goal.
    pub async fn add_body_details(
        &self,
        details: &BodyDetails,
    ) -> Result<Envelope, TransportError> {
        self.post(paths::BODY_DETAILS_ADD, details).await
    }

    /// Onboarding probe; read the answer with [`body_details_exist_flag`].
    pub async fn body_details_exist(&self) -> Result<Envelope, TransportError> {
        self.get(paths::BODY_DETAILS_EXISTS).await
    }

    /// Read with [`net_caloric_balance_value`].
    pub async fn net_caloric_balance(&self) -> Result<Envelope, TransportError> {
        self.get(paths::NET_CALORIC_BALANCE).await
    }

    /// All logs; read with [`monthly_logs_value`].
    pub async fn logs(&self) -> Result<Envelope, TransportError> {
        self.get(paths::LOG_GET).await
    }

    /// Start the log for `date`. A day that already has one comes back as 409.
    pub async fn create_log(&self, date: NaiveDate) -> Result<Envelope, TransportError> {
        self.post(paths::LOG_CREATE, &json!({ "log_date": log_date_to_wire(date) }))
            .await
    }

    /// Add calories to a day's totals.
    pub async fn update_log(&self, update: &CalorieUpdate) -> Result<Envelope, TransportError> {
        self.put(paths::LOG_UPDATE, update).await
    }

    /// Set a day's status letter.
    pub async fn mark_log_status(
        &self,
        date: NaiveDate,
        status: LogStatus,
    ) -> Result<Envelope, TransportError> {
        let body = json!({ "log_date": log_date_to_wire(date), "status": status });
        self.post(paths::LOG_MARK_STATUS, &body).await
    }

    /// Remove a day's log.
    pub async fn delete_log(&self, date: NaiveDate) -> Result<Envelope, TransportError> {
        self.delete(paths::LOG_DELETE, &json!({ "log_date": log_date_to_wire(date) }))
            .await
    }

    /// Change the weight goal.
    pub async fn set_weight_goal(&self, goal: Goal) -> Result<Envelope, TransportError> {
        self.post(paths::SET_WEIGHT_GOAL, &json!({ "goal": goal }))
            .await
    }
}

/// `data.exists` of a body-details probe; `None` unless the envelope is a 200 carrying it.
pub fn body_details_exist_flag(envelope: &Envelope) -> Option<bool> {
    if !envelope.is_ok() {
        return None;
    }
    envelope
        .data_as::<BodyDetailsExists>()
        .map(|payload| payload.exists)
}

/// `data.net_caloric_balance` of a 200 response.
pub fn net_caloric_balance_value(envelope: &Envelope) -> Option<f64> {
    if !envelope.is_ok() {
        return None;
    }
    envelope
        .data_as::<NetCaloricBalance>()
        .map(|payload| payload.net_caloric_balance)
}

/// Monthly logs of a 200 response. A 200 without data is an empty log book.
pub fn monthly_logs_value(envelope: &Envelope) -> Option<MonthlyLogs> {
    if !envelope.is_ok() {
        return None;
    }
    match &envelope.data {
        None => Some(MonthlyLogs::new()),
        Some(_) => envelope.data_as::<LogsPayload>().map(LogsPayload::into_monthly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::header::HeaderMap;

    /// Answers every call with the same body and remembers what was asked.
    struct Scripted {
        body: &'static str,
        seen: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
            self.seen.lock().push(request);
            Ok(RawResponse {
                status: 200,
                redirected: false,
                headers: HeaderMap::new(),
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    fn scripted(body: &'static str) -> (CalometerApi, Arc<Scripted>) {
        let transport = Arc::new(Scripted {
            body,
            seen: Mutex::new(Vec::new()),
        });
        (CalometerApi::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn log_calls_send_midnight_utc_dates() {
        let (api, transport) = scripted(r#"{"code":{"200":"OK"}}"#);
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        api.mark_log_status(day, LogStatus::Done).await.unwrap();
        api.delete_log(day).await.unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].path, paths::LOG_MARK_STATUS);
        assert_eq!(
            seen[0].body,
            Some(json!({ "log_date": "2024-02-29T00:00:00.000Z", "status": "D" }))
        );
        assert_eq!(seen[1].method, Method::Delete);
        assert_eq!(seen[1].path, paths::LOG_DELETE);
    }

    #[tokio::test]
    async fn payload_helpers_read_only_successes() {
        let (api, _) = scripted(r#"{"code":{"200":"OK"},"data":{"net_caloric_balance":-320.5}}"#);
        let envelope = api.net_caloric_balance().await.unwrap();
        assert_eq!(net_caloric_balance_value(&envelope), Some(-320.5));

        let (api, _) = scripted(r#"{"code":{"401":"Unauthorized"},"data":{"exists":true}}"#);
        let envelope = api.body_details_exist().await.unwrap();
        assert_eq!(body_details_exist_flag(&envelope), None);

        let (api, _) = scripted(r#"{"code":{"200":"OK"}}"#);
        let envelope = api.logs().await.unwrap();
        assert_eq!(monthly_logs_value(&envelope), Some(MonthlyLogs::new()));
    }
}
