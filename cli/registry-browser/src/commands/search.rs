use std::io::IsTerminal;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use registry_browser_sdk::models::bootstrap::Bootstrap;
use registry_browser_sdk::models::search::{filter, MatchResult};
use registry_browser_sdk::providers::registry::{CatalogTransport, LogoLoader};
use registry_browser_sdk::providers::storage::SessionStore;
use tracing::{debug, instrument};

use crate::utils::message;
use crate::utils::search::DisplayPackages;

// Search packages by name, version or keyword
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Prefix of a package name, version or keyword
    #[bpaf(positional("query"))]
    pub query: String,
}

impl Search {
    #[instrument(name = "search", fields(query = self.query), skip_all)]
    pub async fn handle<S, C, L>(self, mut bootstrap: Bootstrap<S, C, L>) -> Result<()>
    where
        S: SessionStore,
        C: CatalogTransport,
        L: LogoLoader,
    {
        let results = self.results(&mut bootstrap).await?;
        let display = DisplayPackages::from_matches(&results, std::io::stdout().is_terminal());
        if display.is_empty() {
            message::plain(format!("No packages match '{}'", self.query.trim()));
            return Ok(());
        }

        println!("{display}");
        if let Some(hint) = display.truncated_hint() {
            message::plain(hint);
        }
        Ok(())
    }

    /// Load the catalog and match the query against it.
    async fn results<S, C, L>(
        &self,
        bootstrap: &mut Bootstrap<S, C, L>,
    ) -> Result<Vec<MatchResult>>
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
        }

        let results = filter(bootstrap.catalog(), &self.query);
        debug!(n_results = results.len(), "search finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use registry_browser_sdk::providers::mock::{MemorySessionStore, MockRegistry};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn search_matches_loaded_catalog() {
        let registry = MockRegistry::new().with_packages_json(json!([
            { "name": "react", "version": "18.2.0" },
            { "name": "lodash", "version": "4.17.21" },
            { "name": "redux", "version": "4.2.1" },
        ]));
        let search = Search {
            query: " RE".to_string(),
        };

        let mut bootstrap = Bootstrap::new(MemorySessionStore::new(), &registry, &registry);
        let results = search.results(&mut bootstrap).await.unwrap();
        let labels: Vec<_> = results.iter().map(MatchResult::label).collect();
        assert_eq!(labels, vec!["react", "redux"]);

        let display = DisplayPackages::from_matches(&results, false);
        assert_eq!(
            display.to_string(),
            [
                "react@18.2.0  <no description provided>",
                "redux@4.2.1   <no description provided>",
            ]
            .join("\n")
        );
    }

    #[tokio::test]
    async fn search_prints_matches() {
        let registry = MockRegistry::new().with_packages_json(json!([
            { "name": "react", "version": "18.2.0" },
        ]));
        let search = Search {
            query: "re".to_string(),
        };

        search
            .handle(Bootstrap::new(MemorySessionStore::new(), &registry, &registry))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn catalog_failure_is_not_an_error() {
        let registry = MockRegistry::new().with_packages_error("timeout");
        let search = Search {
            query: "re".to_string(),
        };

        let result = search
            .handle(Bootstrap::new(MemorySessionStore::new(), &registry, &registry))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn storage_failure_is_an_error() {
        let registry = MockRegistry::new();
        let search = Search {
            query: "re".to_string(),
        };

        let result = search
            .handle(Bootstrap::new(MemorySessionStore::failing(), &registry, &registry))
            .await;
        assert!(result.is_err());
    }
}
