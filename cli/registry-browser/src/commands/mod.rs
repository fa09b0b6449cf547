mod auth;
mod list;
mod search;

use std::fmt;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use registry_browser_sdk::models::bootstrap::Bootstrap;
use registry_browser_sdk::models::session::SessionManager;
use registry_browser_sdk::providers::storage::TomlSessionStore;
use registry_client::RegistryClient;
use tracing::debug;

use crate::config::Config;

static BROWSER_DESCRIPTION: &'_ str = indoc! {"
    Browse and search the packages of a private npm registry from the terminal."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(BROWSER_DESCRIPTION))]
pub struct BrowserCli(#[bpaf(external(browser_args))] pub BrowserArgs);

/// Main args parser
///
/// To parse the CLI, use [`BrowserCli`] instead using [`browser_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct BrowserArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Registry to use instead of the configured 'registry_url'
    #[bpaf(long, argument("URL"))]
    pub registry_url: Option<String>,

    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Search packages by name, version or keyword
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// List all packages of the registry
    #[bpaf(command)]
    List(#[bpaf(external(list::list))] list::List),

    /// Log in to the registry
    #[bpaf(command)]
    Login(#[bpaf(external(auth::login))] auth::Login),

    /// Forget the stored session
    #[bpaf(command)]
    Logout(#[bpaf(external(auth::logout))] auth::Logout),

    /// Show the session and registry in use
    #[bpaf(command)]
    Status(#[bpaf(external(auth::status))] auth::Status),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl BrowserArgs {
    pub async fn handle(self, mut config: Config) -> Result<()> {
        if let Some(registry_url) = self.registry_url {
            debug!(%registry_url, "registry overridden on the command line");
            config.registry_url = registry_url;
        }

        let client = RegistryClient::new(config.client_config())
            .context("Could not create the registry client")?;
        let store = TomlSessionStore::new(&config.session_file);
        debug!(?client, session_file = %config.session_file.display(), "initialized");

        match self.command {
            Commands::Search(args) => args.handle(Bootstrap::new(store, &client, &client)).await,
            Commands::List(args) => args.handle(Bootstrap::new(store, &client, &client)).await,
            Commands::Login(args) => args.handle(SessionManager::new(store), &client).await,
            Commands::Logout(args) => args.handle(SessionManager::new(store)),
            Commands::Status(args) => args.handle(SessionManager::new(store), &config),
        }
    }
}
