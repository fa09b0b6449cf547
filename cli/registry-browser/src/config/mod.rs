use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment, File, FileFormat};
use registry_client::RegistryClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Name of the directories the browser keeps its files in (config, data)
const BROWSER_DIR_NAME: &str = "registry-browser";
const BROWSER_CONFIG_DIR_VAR: &str = "REGISTRY_BROWSER_CONFIG_DIR";
const BROWSER_ENV_PREFIX: &str = "REGISTRY_BROWSER";
pub const BROWSER_CONFIG_FILE: &str = "registry-browser.toml";
const SESSION_FILE: &str = "session.toml";

pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:4873";
pub const DEFAULT_API_PATH: &str = "-/verdaccio";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Root URL of the registry, as used by npm
    pub registry_url: String,
    /// Path of the web API below `registry_url`
    pub api_path: String,
    /// Package scope served by the registry, without the leading `@`
    pub scope: Option<String>,
    /// File the session is persisted in (default:
    /// `$XDG_DATA_HOME/registry-browser/session.toml`)
    pub session_file: PathBuf,
    /// Directory the configuration file was loaded from (default:
    /// `$XDG_CONFIG_HOME/registry-browser`)
    pub config_dir: PathBuf,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load the layered configuration.
    ///
    /// Later layers override earlier ones:
    /// defaults, `/etc`, the user config file, `REGISTRY_BROWSER_*` variables.
    pub fn parse() -> Result<Config> {
        let config_dir = match env::var(BROWSER_CONFIG_DIR_VAR) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .context("Could not determine the user config directory")?
                .join(BROWSER_DIR_NAME),
        };
        let data_dir = dirs::data_dir()
            .context("Could not determine the user data directory")?
            .join(BROWSER_DIR_NAME);

        Self::parse_in(&config_dir, &data_dir)
    }

    fn parse_in(config_dir: &Path, data_dir: &Path) -> Result<Config> {
        debug!(config_dir = %config_dir.display(), "reading config");

        let session_file = data_dir.join(SESSION_FILE);
        let config_file = config_dir.join(BROWSER_CONFIG_FILE);
        trace!(config_file = %config_file.display());

        let raw = HierarchicalConfig::builder()
            .set_default("registry_url", DEFAULT_REGISTRY_URL)?
            .set_default("api_path", DEFAULT_API_PATH)?
            .set_default("session_file", session_file.to_string_lossy().into_owned())?
            .set_default(
                "connect_timeout_secs",
                registry_client::DEFAULT_CONNECT_TIMEOUT.as_secs() as i64,
            )?
            .set_default(
                "request_timeout_secs",
                registry_client::DEFAULT_REQUEST_TIMEOUT.as_secs() as i64,
            )?
            // the config file cannot change the directory it is read from
            .set_override("config_dir", config_dir.to_string_lossy().into_owned())?
            .add_source(
                File::from(PathBuf::from("/etc").join(BROWSER_DIR_NAME).join(BROWSER_CONFIG_FILE))
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(BROWSER_ENV_PREFIX).try_parsing(true))
            .build()
            .context("Could not read config")?;

        raw.try_deserialize().context("Could not parse config")
    }

    /// Base URL of the registry web API.
    pub fn api_url(&self) -> String {
        let root = self.registry_url.trim_end_matches('/');
        let path = self.api_path.trim_matches('/');
        if path.is_empty() {
            root.to_string()
        } else {
            format!("{root}/{path}")
        }
    }

    pub fn client_config(&self) -> RegistryClientConfig {
        RegistryClientConfig {
            api_url: self.api_url(),
            extra_headers: self.extra_headers.clone(),
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// The npm command pointing a client at this registry.
    pub fn npm_hint(&self) -> String {
        match self.scope.as_deref().map(|scope| scope.trim_start_matches('@')) {
            Some(scope) if !scope.is_empty() => {
                format!("npm set @{scope}:registry {}", self.registry_url)
            },
            _ => format!("npm set registry {}", self.registry_url),
        }
    }
}
