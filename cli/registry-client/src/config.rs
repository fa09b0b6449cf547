//! Configuration types for registry client construction.

use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for registry client construction.
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    /// Base URL of the registry web API, e.g. `http://localhost:4873/-/verdaccio`.
    pub api_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// User agent sent with every request, reqwest's default if unset.
    pub user_agent: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
