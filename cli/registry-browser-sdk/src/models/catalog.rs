use derive_more::Deref;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::alert::AlertContent;
use super::package::PackageRecord;
use crate::providers::registry::{CatalogTransport, TransportError};

/// The ordered package list of the registry.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct Catalog(Vec<PackageRecord>);

impl Catalog {
    pub fn records(&self) -> &[PackageRecord] {
        &self.0
    }

    pub fn into_records(self) -> Vec<PackageRecord> {
        self.0
    }
}

impl FromIterator<PackageRecord> for Catalog {
    fn from_iter<T: IntoIterator<Item = PackageRecord>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<PackageRecord>> for Catalog {
    fn from(records: Vec<PackageRecord>) -> Self {
        Self(records)
    }
}

#[derive(Debug, Error)]
#[error("Unable to load package list: {0}")]
pub struct CatalogLoadError(pub TransportError);

impl CatalogLoadError {
    pub fn to_alert(&self) -> AlertContent {
        AlertContent::warning(self.to_string())
    }
}

/// Loads the package list through a [CatalogTransport] and holds the
/// last successfully loaded [Catalog].
#[derive(Debug)]
pub struct PackageCatalog<C> {
    transport: C,
    packages: Catalog,
}

impl<C: CatalogTransport> PackageCatalog<C> {
    pub fn new(transport: C) -> Self {
        Self {
            transport,
            packages: Catalog::default(),
        }
    }

    /// Fetch the package list, authenticated with `token` if given.
    ///
    /// Listings without a name are skipped.
    /// On failure the catalog is left empty.
    #[instrument(skip_all, fields(authenticated = token.is_some()))]
    pub async fn load(&mut self, token: Option<&str>) -> Result<&Catalog, CatalogLoadError> {
        let raw = match self.transport.fetch_packages(token).await {
            Ok(raw) => raw,
            Err(e) => {
                self.packages = Catalog::default();
                return Err(CatalogLoadError(e));
            },
        };

        let total = raw.len();
        let packages: Catalog = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match PackageRecord::try_from(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, "skipping package listing: {e}");
                    None
                },
            })
            .collect();

        debug!(total, loaded = packages.len(), "loaded package list");
        self.packages = packages;
        Ok(&self.packages)
    }

    pub fn current(&self) -> &Catalog {
        &self.packages
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }
}
