//! HTTP basic authentication middleware for the broker API.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::ApiConfig;

/// Challenge sent with every 401.
pub const BASIC_REALM: &str = r#"Basic realm="diaats""#;

/// Shared auth state injected via axum middleware state.
#[derive(Clone, Default)]
pub struct AuthState {
    credentials: Option<(String, SecretString)>,
}

impl AuthState {
    /// Enforce `username`/`password` on every request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some((username.into(), SecretString::from(password.into()))),
        }
    }

    /// Let every request through.
    pub fn open() -> Self {
        Self::default()
    }

    /// Auth is enforced only when both username and password are configured.
    pub fn from_config(config: &ApiConfig) -> Self {
        match config.credentials() {
            Some((user, pass)) => Self::new(user, pass),
            None => Self::open(),
        }
    }

    fn accepts(&self, username: &str, password: &str) -> bool {
        match &self.credentials {
            Some((user, pass)) => {
                let user_ok = username.as_bytes().ct_eq(user.as_bytes());
                let pass_ok = password.as_bytes().ct_eq(pass.expose_secret().as_bytes());
                bool::from(user_ok & pass_ok)
            }
            None => true,
        }
    }
}

/// Decode `Basic <base64(user:pass)>` into its two halves.
fn basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Auth middleware that validates basic credentials from the Authorization header.
pub async fn basic_auth_middleware(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if auth.credentials.is_none() {
        return next.run(request).await;
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(value) = auth_header.to_str()
        && let Some((user, pass)) = basic_credentials(value)
        && auth.accepts(&user, &pass)
    {
        return next.run(request).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, BASIC_REALM)],
    )
        .into_response()
}
