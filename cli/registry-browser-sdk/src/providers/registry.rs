//! Contracts of the remote registry as consumed by the browser,
//! and their implementation by [RegistryClient].

use registry_client::{LoginResponse, RegistryClient, RegistryClientError};
use thiserror::Error;
use tracing::debug;

pub use registry_client::RawPackage;

use crate::models::session::LoginError;

/// Username and token issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl From<LoginResponse> for Credentials {
    fn from(response: LoginResponse) -> Self {
        Self {
            username: response.username,
            token: response.token,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Client(#[from] RegistryClientError),
    #[error("{0}")]
    Other(String),
}

/// Exchanges credentials for a session token.
#[allow(async_fn_in_trait)]
pub trait LoginService {
    /// Bad credentials and transport failures are both reported as [LoginError].
    async fn login(&self, username: &str, password: &str) -> Result<Credentials, LoginError>;
}

/// Fetches the package list of the registry.
#[allow(async_fn_in_trait)]
pub trait CatalogTransport {
    async fn fetch_packages(&self, token: Option<&str>) -> Result<Vec<RawPackage>, TransportError>;
}

/// Resolves the URL of the registry logo.
#[allow(async_fn_in_trait)]
pub trait LogoLoader {
    async fn load_logo(&self) -> Result<String, TransportError>;
}

impl<T: LoginService + ?Sized> LoginService for &T {
    async fn login(&self, username: &str, password: &str) -> Result<Credentials, LoginError> {
        (**self).login(username, password).await
    }
}

impl<T: CatalogTransport + ?Sized> CatalogTransport for &T {
    async fn fetch_packages(&self, token: Option<&str>) -> Result<Vec<RawPackage>, TransportError> {
        (**self).fetch_packages(token).await
    }
}

impl<T: LogoLoader + ?Sized> LogoLoader for &T {
    async fn load_logo(&self) -> Result<String, TransportError> {
        (**self).load_logo().await
    }
}

// ---------------------------------------------------------------------------
// Implementations for RegistryClient
// ---------------------------------------------------------------------------

impl LoginService for RegistryClient {
    async fn login(&self, username: &str, password: &str) -> Result<Credentials, LoginError> {
        match RegistryClient::login(self, username, password).await {
            Ok(response) => Ok(response.into()),
            Err(e) => {
                debug!(error = %e, "login rejected by registry");
                Err(LoginError::new(e.detail()))
            },
        }
    }
}

impl CatalogTransport for RegistryClient {
    async fn fetch_packages(&self, token: Option<&str>) -> Result<Vec<RawPackage>, TransportError> {
        Ok(self.packages(token).await?)
    }
}

impl LogoLoader for RegistryClient {
    async fn load_logo(&self) -> Result<String, TransportError> {
        Ok(self.logo(None).await?)
    }
}
