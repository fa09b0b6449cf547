//! In-memory fakes of the collaborators.
//!
//! All fakes can share a [CallLog] so tests can assert on the order
//! in which storage and registry were accessed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

use super::registry::{
    CatalogTransport,
    Credentials,
    LoginService,
    LogoLoader,
    RawPackage,
    TransportError,
};
use super::storage::{SessionKey, SessionStore, StorageError};
use crate::models::session::LoginError;

/// An observable interaction with a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StoreGet(SessionKey),
    StoreSet(SessionKey, String),
    StoreRemove(SessionKey),
    Login(String),
    FetchPackages(Option<String>),
    LoadLogo,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.0.lock().expect("call log mutex poisoned").push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().expect("call log mutex poisoned").clone()
    }
}

/// Build an unsigned token whose payload carries the given expiry.
pub fn fake_token(expires_at: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(
        r#"{{"name":"alice","exp":{}}}"#,
        expires_at.timestamp()
    ));
    format!("{header}.{payload}.signature")
}

// ---------------------------------------------------------------------------
// Session storage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<SessionKey, String>,
    log: CallLog,
    failing: bool,
    failing_set: Option<SessionKey>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(username: &str, token: &str) -> Self {
        let mut store = Self::new();
        store
            .values
            .insert(SessionKey::Username, username.to_string());
        store.values.insert(SessionKey::Token, token.to_string());
        store
    }

    pub fn with_value(mut self, key: SessionKey, value: &str) -> Self {
        self.values.insert(key, value.to_string());
        self
    }

    /// A store for which every operation fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Make writes of `key` fail, all other operations succeed.
    pub fn with_failing_set(mut self, key: SessionKey) -> Self {
        self.failing_set = Some(key);
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Read a value without recording the access.
    pub fn value(&self, key: SessionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Other("session storage unavailable".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        self.log.record(Call::StoreGet(key));
        self.check()?;
        Ok(self.values.get(&key).cloned())
    }

    fn set(&mut self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        self.log.record(Call::StoreSet(key, value.to_string()));
        self.check()?;
        if self.failing_set == Some(key) {
            return Err(StorageError::Other(format!("cannot write {key:?}")));
        }
        self.values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: SessionKey) -> Result<(), StorageError> {
        self.log.record(Call::StoreRemove(key));
        self.check()?;
        self.values.remove(&key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A registry answering every request with a canned response.
#[derive(Debug)]
pub struct MockRegistry {
    packages: Result<Vec<RawPackage>, String>,
    login: Result<Credentials, String>,
    logo: Result<String, String>,
    log: CallLog,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self {
            packages: Ok(Vec::new()),
            login: Err("bad username/password, access denied".to_string()),
            logo: Ok(String::new()),
            log: CallLog::default(),
        }
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packages(mut self, packages: Vec<RawPackage>) -> Self {
        self.packages = Ok(packages);
        self
    }

    /// Set the package list from a JSON array.
    ///
    /// Panics if the value is not an array of objects.
    pub fn with_packages_json(self, packages: serde_json::Value) -> Self {
        let packages =
            serde_json::from_value(packages).expect("packages must be a JSON array of objects");
        self.with_packages(packages)
    }

    pub fn with_packages_error(mut self, message: &str) -> Self {
        self.packages = Err(message.to_string());
        self
    }

    pub fn with_login(mut self, username: &str, token: &str) -> Self {
        self.login = Ok(Credentials {
            username: username.to_string(),
            token: token.to_string(),
        });
        self
    }

    pub fn with_login_error(mut self, description: &str) -> Self {
        self.login = Err(description.to_string());
        self
    }

    pub fn with_logo(mut self, url: &str) -> Self {
        self.logo = Ok(url.to_string());
        self
    }

    pub fn with_logo_error(mut self, message: &str) -> Self {
        self.logo = Err(message.to_string());
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }
}

impl LoginService for MockRegistry {
    async fn login(&self, username: &str, _password: &str) -> Result<Credentials, LoginError> {
        self.log.record(Call::Login(username.to_string()));
        self.login.clone().map_err(LoginError::new)
    }
}

impl CatalogTransport for MockRegistry {
    async fn fetch_packages(&self, token: Option<&str>) -> Result<Vec<RawPackage>, TransportError> {
        self.log
            .record(Call::FetchPackages(token.map(ToString::to_string)));
        self.packages.clone().map_err(TransportError::Other)
    }
}

impl LogoLoader for MockRegistry {
    async fn load_logo(&self) -> Result<String, TransportError> {
        self.log.record(Call::LoadLogo);
        self.logo.clone().map_err(TransportError::Other)
    }
}
