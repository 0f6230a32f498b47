#![allow(dead_code)]

//! Scriptable stand-in for the backend, served by axum on an ephemeral port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use calometer_core::{
    CalometerApi, ClientConfig, HttpTransport, RecordingNotifier, ScreenContext, SessionRule,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub set_cookie: Option<String>,
}

impl Reply {
    /// Standard envelope: `{"code": {"<code>": "<message>"}, "data": ...}` over HTTP 200.
    pub fn envelope(code: u16, message: &str, data: Value) -> Self {
        let mut mapping = serde_json::Map::new();
        mapping.insert(code.to_string(), Value::from(message));
        let body = json!({ "code": Value::Object(mapping), "data": data });
        Self {
            status: 200,
            body: body.to_string(),
            set_cookie: None,
        }
    }

    pub fn ok(data: Value) -> Self {
        Self::envelope(200, "OK", data)
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            set_cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookie = Some(cookie.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
    pub cookie: Option<String>,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct Backend {
    script: Arc<Mutex<Script>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, path: &str, reply: Reply) -> &Self {
        self.script.lock().replies.insert(path.to_string(), reply);
        self
    }

    pub fn hits(&self, path: &str) -> usize {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|request| request.path == path)
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.script.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().requests.clone()
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.script
            .lock()
            .requests
            .iter()
            .rev()
            .find(|request| request.path == path)
            .map(|request| request.body.clone())
    }

    pub async fn spawn(&self) -> (SocketAddr, JoinHandle<()>) {
        let router = Router::new().fallback(handle).with_state(self.clone());
        spawn_router(router).await
    }
}

async fn handle(
    State(backend): State<Backend>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let reply = {
        let mut script = backend.script.lock();
        script.requests.push(Recorded {
            path: path.clone(),
            body: parsed,
            cookie,
        });
        script.replies.get(&path).cloned()
    };
    let reply = reply.unwrap_or_else(|| Reply::envelope(404, "Not found", Value::Null));

    let mut response = Response::builder()
        .status(StatusCode::from_u16(reply.status).unwrap())
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = &reply.set_cookie {
        response = response.header(header::SET_COOKIE, cookie);
    }
    response.body(Body::from(reply.body)).unwrap()
}

async fn spawn_router(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, handle)
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind");
    listener.local_addr().expect("addr")
}

pub fn transport(addr: SocketAddr) -> Arc<HttpTransport> {
    let config = ClientConfig::with_api_url(format!("http://{addr}"));
    Arc::new(HttpTransport::new(&config).expect("transport"))
}

pub fn context(addr: SocketAddr) -> (ScreenContext, RecordingNotifier) {
    context_with_rule(addr, SessionRule::default())
}

pub fn context_with_rule(addr: SocketAddr, rule: SessionRule) -> (ScreenContext, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let api = CalometerApi::new(transport(addr));
    let ctx = ScreenContext::new(api, Arc::new(notifier.clone()), rule);
    (ctx, notifier)
}

pub fn exists(flag: bool) -> Reply {
    Reply::ok(json!({ "exists": flag }))
}
