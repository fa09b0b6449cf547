//! Session lifecycle: restore, login, logout and token expiry.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::providers::registry::LoginService;
use crate::providers::storage::{SessionKey, SessionStore, StorageError};

pub const LOGIN_ERROR_TITLE: &str = "Unable to login";
pub const EMPTY_CREDENTIALS_DESCRIPTION: &str = "Username or password can't be empty!";

/// Tokens are treated as expired this many seconds before their `exp` claim.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(session) => Some(session),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn username(&self) -> Option<&str> {
        self.session().map(|session| session.username.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|session| session.token.as_str())
    }
}

/// A login failure meant to be shown next to the login form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {description}")]
pub struct LoginError {
    pub title: String,
    pub description: String,
}

impl LoginError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            title: LOGIN_ERROR_TITLE.to_string(),
            description: description.into(),
        }
    }

    pub fn empty_credentials() -> Self {
        Self::new(EMPTY_CREDENTIALS_DESCRIPTION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn(Session),
    Rejected(LoginError),
}

/// Owns the in-memory session and keeps the [SessionStore] in sync with it.
#[derive(Debug)]
pub struct SessionManager<S> {
    store: S,
    state: SessionState,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn username(&self) -> Option<&str> {
        self.state.username()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restore the session from storage.
    ///
    /// A missing or expired token, or a missing username, clears the
    /// stored session and yields [SessionState::Anonymous].
    /// Only storage failures are returned as errors.
    pub fn restore(&mut self) -> Result<SessionState, StorageError> {
        self.restore_at(Utc::now())
    }

    #[instrument(skip_all)]
    pub fn restore_at(&mut self, now: DateTime<Utc>) -> Result<SessionState, StorageError> {
        let token = self.store.get(SessionKey::Token)?;
        let username = self
            .store
            .get(SessionKey::Username)?
            .filter(|username| !username.is_empty());

        match (username, token) {
            (Some(username), Some(token)) if !is_token_expired(Some(&token), now) => {
                debug!(%username, "restored session");
                self.state = SessionState::Authenticated(Session { username, token });
            },
            (username, token) => {
                debug!(
                    has_username = username.is_some(),
                    has_token = token.is_some(),
                    "stored session is invalid or expired, logging out"
                );
                self.logout()?;
            },
        }

        Ok(self.state.clone())
    }

    /// Exchange credentials through `service` and persist the session.
    ///
    /// Rejections are returned as [LoginOutcome::Rejected] and leave the
    /// session anonymous without touching storage.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        &mut self,
        service: &impl LoginService,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, StorageError> {
        if username.is_empty() || password.is_empty() {
            self.state = SessionState::Anonymous;
            return Ok(LoginOutcome::Rejected(LoginError::empty_credentials()));
        }

        let credentials = match service.login(username, password).await {
            Ok(credentials) if !credentials.username.is_empty() && !credentials.token.is_empty() => {
                credentials
            },
            Ok(_) => {
                self.state = SessionState::Anonymous;
                return Ok(LoginOutcome::Rejected(LoginError::new(
                    "The registry returned an incomplete session",
                )));
            },
            Err(error) => {
                debug!(%error, "login failed");
                self.state = SessionState::Anonymous;
                return Ok(LoginOutcome::Rejected(error));
            },
        };

        // a failed write must not leave the previous session in memory
        self.state = SessionState::Anonymous;
        self.store.set(SessionKey::Username, &credentials.username)?;
        self.store.set(SessionKey::Token, &credentials.token)?;

        let session = Session {
            username: credentials.username,
            token: credentials.token,
        };
        info!(username = %session.username, "logged in");
        self.state = SessionState::Authenticated(session.clone());

        Ok(LoginOutcome::LoggedIn(session))
    }

    /// Clear the stored session and become anonymous.
    ///
    /// Calling this while already anonymous is harmless.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.store.remove(SessionKey::Username)?;
        self.store.remove(SessionKey::Token)?;
        self.state = SessionState::Anonymous;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: Option<f64>,
}

#[derive(Debug, Error)]
enum TokenError {
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn decode_claims(payload: &str) -> Result<TokenClaims, TokenError> {
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Whether `token` is unusable at `now`.
///
/// The token is expected to be `header.payload.signature` with a base64
/// JSON payload carrying a numeric `exp` claim (seconds since the epoch).
/// Absent, malformed and claim-less tokens count as expired.
/// The signature is not verified.
pub fn is_token_expired(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };
    let Some(payload) = token.split('.').nth(1).filter(|payload| !payload.is_empty()) else {
        return true;
    };

    let claims = match decode_claims(payload) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "invalid token");
            return true;
        },
    };
    let Some(exp) = claims.exp else {
        return true;
    };

    // compared as floats, `exp` may lie far outside the range of a timestamp
    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    now_secs >= exp - TOKEN_EXPIRY_SKEW_SECS as f64
}
