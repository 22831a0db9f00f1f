//! Local stand-ins for the accounts and Web API servers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use sptui_proto::config::AuthConfig;

pub type FormLog = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Serve `app` on an ephemeral port, returning `http://127.0.0.1:<port>`.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Token endpoint answering every POST with `response`, recording the forms.
pub async fn token_server(response: Value) -> (String, FormLog) {
    let log: FormLog = Arc::default();
    let state = (log.clone(), Arc::new(response));
    let app = Router::new()
        .route(
            "/api/token",
            post(
                |State((log, response)): State<(FormLog, Arc<Value>)>,
                 Form(form): Form<HashMap<String, String>>| async move {
                    log.lock().unwrap().push(form);
                    Json((*response).clone())
                },
            ),
        )
        .with_state(state);
    let base = serve(app).await;
    (format!("{}/api/token", base), log)
}

/// Token endpoint that always rejects the grant.
pub async fn rejecting_token_server() -> String {
    let app = Router::new().route(
        "/api/token",
        post(|| async { (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#) }),
    );
    format!("{}/api/token", serve(app).await)
}

/// Records the `Authorization` header of each request it answers.
pub type AuthLog = Arc<Mutex<Vec<String>>>;

pub fn record_auth(log: &AuthLog, headers: &HeaderMap) {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    log.lock().unwrap().push(value);
}

pub fn auth_config(token_url: &str, redirect_port: u16) -> AuthConfig {
    AuthConfig {
        token_url: token_url.to_string(),
        redirect_host: "127.0.0.1".to_string(),
        redirect_port,
        login_timeout_secs: 5,
        open_browser: false,
        ..AuthConfig::default()
    }
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
