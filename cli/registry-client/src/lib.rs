//! HTTP client for the web API of a package registry.
//!
//! This crate provides:
//! - HTTP client construction with bearer token authentication
//! - Typed access to the `packages`, `login` and `logo` resources
//! - Common error handling for registry API responses
//!
//! ## Usage
//!
//! ```ignore
//! use registry_client::{RegistryClient, RegistryClientConfig};
//!
//! let config = RegistryClientConfig {
//!     api_url: "http://localhost:4873/-/verdaccio".to_string(),
//!     ..Default::default()
//! };
//!
//! let client = RegistryClient::new(config)?;
//! let packages = client.packages(None).await?;
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::RegistryClient;
pub use config::{RegistryClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use error::RegistryClientError;
pub use types::{LoginRequest, LoginResponse, RawPackage};
