//! OAuth2 authorization-code flow with PKCE.
//!
//! One login attempt:
//! ```text
//!  Init             verifier / challenge / state generated
//!  Listening        one-shot redirect listener bound on the fixed port
//!  Awaiting         authorize URL reported + opened in the browser
//!  Callback         state validated, code handed over the mailbox
//!  Token-Acquired   code + verifier exchanged, session persisted
//! ```
//!
//! The listener and its mailbox belong to a single attempt and are torn down
//! when the attempt finishes, whatever the outcome.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::platform;
use crate::session::{CredentialStore, Session, StoredSession};

/// Expiry assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRY_SECS: i64 = 3600;

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

// ── PKCE ──────────────────────────────────────────────────────────────────────

/// Verifier/challenge pair plus the anti-forgery `state` for one attempt.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = random_token(VERIFIER_BYTES);
        let challenge = Self::challenge_for(&verifier);
        let state = random_token(STATE_BYTES);
        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// `base64url(sha256(verifier))`, no padding.
    pub fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ── Redirect listener ─────────────────────────────────────────────────────────

/// Query parameters of the provider's redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Check a redirect against the state generated for this attempt.
/// A mismatching state fails closed before anything else is looked at.
pub fn validate_callback(expected_state: &str, params: &CallbackParams) -> Result<String, AuthError> {
    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    if let Some(err) = &params.error {
        return Err(AuthError::Denied(err.clone()));
    }
    match &params.code {
        Some(code) if !code.is_empty() => Ok(code.clone()),
        _ => Err(AuthError::MissingCode),
    }
}

type CallbackResult = Result<String, AuthError>;

/// Single-use slot: the first request takes the sender, later ones find it empty.
type Mailbox = Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    mailbox: Mailbox,
}

pub struct CallbackListener {
    addr: SocketAddr,
    result_rx: oneshot::Receiver<CallbackResult>,
    shutdown_tx: oneshot::Sender<()>,
}

impl CallbackListener {
    /// Bind `127.0.0.1:port` and serve `path` until a callback arrives or the
    /// listener is dropped. Port 0 picks an ephemeral port.
    pub async fn bind(port: u16, path: &str, expected_state: &str) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(AuthError::Listener)?;
        let addr = listener.local_addr().map_err(AuthError::Listener)?;

        let (result_tx, result_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = CallbackState {
            expected_state: Arc::from(expected_state),
            mailbox: Arc::new(Mutex::new(Some(result_tx))),
        };
        let app = Router::new()
            .route(path, get(handle_callback))
            .with_state(state);

        tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                error!("redirect listener error: {}", e);
            }
            debug!("redirect listener stopped");
        });

        info!("redirect listener on http://{}", addr);
        Ok(Self {
            addr,
            result_rx,
            shutdown_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the redirect, then stop the listener.
    pub async fn wait(self, timeout: Duration) -> Result<String, AuthError> {
        let outcome = tokio::time::timeout(timeout, self.result_rx).await;
        let _ = self.shutdown_tx.send(());
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AuthError::Listener(std::io::Error::other(
                "redirect listener stopped before a callback arrived",
            ))),
            Err(_) => Err(AuthError::Timeout),
        }
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let sender = match state.mailbox.lock() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
    };
    let Some(sender) = sender else {
        return (StatusCode::GONE, "This login attempt is already finished.");
    };

    let result = validate_callback(&state.expected_state, &params);
    let response = match &result {
        Ok(_) => (
            StatusCode::OK,
            "Login complete. You can close this window and return to the terminal.",
        ),
        Err(AuthError::StateMismatch) => {
            warn!("redirect rejected: state mismatch");
            (StatusCode::FORBIDDEN, "Login rejected: state mismatch.")
        }
        Err(e) => {
            warn!("redirect rejected: {}", e);
            (StatusCode::BAD_REQUEST, "Login failed. See the terminal for details.")
        }
    };
    let _ = sender.send(result);
    response
}

// ── Token endpoint ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_session(self, previous_refresh: Option<&str>) -> Session {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRY_SECS);
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default();
        let mut session = Session::new(
            self.access_token,
            refresh_token,
            Utc::now() + chrono::Duration::seconds(expires_in),
        );
        if let Some(token_type) = self.token_type {
            session.token_type = token_type;
        }
        session
    }
}

pub struct Authenticator {
    config: AuthConfig,
    client_id: String,
    http: reqwest::Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig, client_id: Option<String>) -> Result<Self, AuthError> {
        let client_id = client_id.ok_or(AuthError::MissingClientId)?;
        Ok(Self {
            config,
            client_id,
            http: reqwest::Client::new(),
        })
    }

    /// Client id taken from `SPOTIFY_ID`.
    pub fn from_env(config: AuthConfig) -> Result<Self, AuthError> {
        Self::new(config, platform::client_id_from_env())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn authorize_url(&self, pkce: &Pkce) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", &self.config.redirect_uri()),
            ("scope", &self.config.scope_param()),
            ("state", &pkce.state),
            ("code_challenge_method", "S256"),
            ("code_challenge", &pkce.challenge),
        ];
        match reqwest::Url::parse_with_params(&self.config.authorize_url, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("authorize url {:?} is invalid: {}", self.config.authorize_url, e);
                self.config.authorize_url.clone()
            }
        }
    }

    /// Produce a usable session: reuse a valid stored one, refresh an expired
    /// one, or run the browser flow when none is stored. New sessions are
    /// persisted before returning.
    pub async fn login<F>(&self, store: &CredentialStore, on_url: F) -> Result<Session, AuthError>
    where
        F: FnOnce(&str) + Send,
    {
        match store.load()? {
            StoredSession::Valid(session) => {
                info!("using stored session");
                Ok(session)
            }
            StoredSession::Expired(session) => {
                let fresh = self.refresh(&session).await?;
                store.save(&fresh)?;
                Ok(fresh)
            }
            StoredSession::NotFound => {
                let fresh = self.authorize(on_url).await?;
                store.save(&fresh)?;
                Ok(fresh)
            }
        }
    }

    /// Interactive browser login. `on_url` receives the authorize URL once the
    /// listener is ready.
    pub async fn authorize<F>(&self, on_url: F) -> Result<Session, AuthError>
    where
        F: FnOnce(&str) + Send,
    {
        let pkce = Pkce::generate();
        let listener = CallbackListener::bind(
            self.config.redirect_port,
            &self.config.redirect_path,
            &pkce.state,
        )
        .await?;

        let url = self.authorize_url(&pkce);
        on_url(&url);
        if self.config.open_browser {
            if let Err(e) = open::that_detached(&url) {
                warn!("could not open browser: {}", e);
            }
        }

        let code = listener.wait(self.config.login_timeout()).await?;
        info!("authorization code received");
        self.exchange_code(&code, &pkce.verifier).await
    }

    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, AuthError> {
        let redirect_uri = self.config.redirect_uri();
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", verifier),
        ];
        let token = self.request_token(&form).await?;
        Ok(token.into_session(None))
    }

    /// Trade the stored refresh token for a new session.
    pub async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        info!("refreshing session");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        let token = self.request_token(&form).await?;
        Ok(token.into_session(Some(&session.refresh_token)))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let resp = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<TokenResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_shapes() {
        let pkce = Pkce::generate();
        // 32 bytes → 43 chars, 16 bytes → 22 chars, no padding.
        assert_eq!(pkce.verifier.len(), 43);
        assert_eq!(pkce.state.len(), 22);
        assert_eq!(pkce.challenge.len(), 43);
        assert!(!pkce.verifier.contains('='));
        assert!(!pkce.verifier.contains('+') && !pkce.verifier.contains('/'));
        assert_eq!(pkce.challenge, Pkce::challenge_for(&pkce.verifier));
    }

    #[test]
    fn challenge_matches_rfc7636_vector() {
        assert_eq!(
            Pkce::challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn attempts_do_not_repeat() {
        let a = Pkce::generate();
        let b = Pkce::generate();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn callback_state_mismatch_fails_closed() {
        let params = CallbackParams {
            code: Some("abc".into()),
            state: Some("forged".into()),
            error: None,
        };
        assert!(matches!(
            validate_callback("expected", &params),
            Err(AuthError::StateMismatch)
        ));

        let missing = CallbackParams {
            code: Some("abc".into()),
            ..CallbackParams::default()
        };
        assert!(matches!(
            validate_callback("expected", &missing),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn callback_reports_denial_and_missing_code() {
        let denied = CallbackParams {
            code: None,
            state: Some("s".into()),
            error: Some("access_denied".into()),
        };
        assert!(matches!(
            validate_callback("s", &denied),
            Err(AuthError::Denied(e)) if e == "access_denied"
        ));

        let empty = CallbackParams {
            code: Some(String::new()),
            state: Some("s".into()),
            error: None,
        };
        assert!(matches!(validate_callback("s", &empty), Err(AuthError::MissingCode)));

        let ok = CallbackParams {
            code: Some("the-code".into()),
            state: Some("s".into()),
            error: None,
        };
        assert_eq!(validate_callback("s", &ok).unwrap(), "the-code");
    }

    #[test]
    fn authorize_url_carries_pkce_parameters() {
        let auth = Authenticator::new(AuthConfig::default(), Some("client-1".into())).unwrap();
        let pkce = Pkce::generate();
        let url = reqwest::Url::parse(&auth.authorize_url(&pkce)).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "http://localhost:21112/callback");
        assert_eq!(pairs["state"], pkce.state);
        assert_eq!(pairs["code_challenge"], pkce.challenge);
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert!(pairs["scope"].contains("user-library-read"));
    }

    #[test]
    fn missing_client_id_is_rejected() {
        assert!(matches!(
            Authenticator::new(AuthConfig::default(), None),
            Err(AuthError::MissingClientId)
        ));
    }

    #[test]
    fn token_response_defaults_expiry_and_keeps_refresh_token() {
        let before = Utc::now();
        let resp = TokenResponse {
            access_token: "new".into(),
            token_type: None,
            expires_in: None,
            refresh_token: None,
        };
        let session = resp.into_session(Some("old-refresh"));
        assert_eq!(session.access_token, "new");
        assert_eq!(session.refresh_token, "old-refresh");
        assert_eq!(session.token_type, "Bearer");
        let secs = (session.expiry - before).num_seconds();
        assert!((DEFAULT_EXPIRY_SECS - 5..=DEFAULT_EXPIRY_SECS + 5).contains(&secs));
    }
}
