use anyhow::{Context, Result};
use bpaf::Bpaf;
use registry_browser_sdk::models::bootstrap::Bootstrap;
use registry_browser_sdk::providers::registry::{CatalogTransport, LogoLoader};
use registry_browser_sdk::providers::storage::SessionStore;
use tracing::instrument;

use crate::utils::message;
use crate::utils::search::DisplayPackages;

// List all packages of the registry
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Only print package names
    #[bpaf(short, long)]
    pub name: bool,
}

impl List {
    #[instrument(name = "list", skip_all)]
    pub async fn handle<S, C, L>(self, mut bootstrap: Bootstrap<S, C, L>) -> Result<()>
    where
        S: SessionStore,
        C: CatalogTransport,
        L: LogoLoader,
    {
        let outcome = bootstrap
            .run()
            .await
            .context("Could not start the browser")?;
        if let Some(alert) = outcome.alert() {
            message::warning(&alert.message);
            return Ok(());
        }

        let catalog = bootstrap.catalog();
        if catalog.is_empty() {
            message::plain("The registry has no packages");
            return Ok(());
        }

        if self.name {
            for record in catalog.iter() {
                println!("{}", record.label());
            }
        } else {
            println!("{}", DisplayPackages::from_records(catalog));
        }
        Ok(())
    }
}
