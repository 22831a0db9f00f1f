//! Error types shared by the credential store, the authenticator and the
//! Web API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{} is not set", crate::platform::CLIENT_ID_ENV)]
    MissingClientId,
    #[error("state mismatch in authorization callback")]
    StateMismatch,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("authorization callback carried no code")]
    MissingCode,
    #[error("timed out waiting for the browser redirect")]
    Timeout,
    #[error("redirect listener failed: {0}")]
    Listener(#[source] std::io::Error),
    #[error("token endpoint rejected the request ({status}): {body}")]
    Exchange { status: u16, body: String },
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
