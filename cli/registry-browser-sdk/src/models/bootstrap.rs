//! Startup sequence of the browser.
//!
//! [Bootstrap::run] resolves the registry logo, restores the session and
//! loads the catalog, one step after the other.
//! A catalog failure degrades the result to an alert instead of
//! failing the startup.

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::alert::{AlertContent, AlertDialog};
use super::catalog::{Catalog, PackageCatalog};
use super::session::{SessionManager, SessionState};
use crate::providers::registry::{CatalogTransport, LogoLoader};
use crate::providers::storage::{SessionStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapPhase {
    #[default]
    Idle,
    Loading,
    SessionRestoring,
    SessionReady,
    SessionAnonymous,
    CatalogLoading,
    CatalogReady,
    CatalogFailed,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Ready {
        session: SessionState,
        catalog: Catalog,
    },
    /// The catalog could not be loaded.
    Degraded {
        session: SessionState,
        alert: AlertContent,
    },
}

impl BootstrapOutcome {
    pub fn session(&self) -> &SessionState {
        match self {
            BootstrapOutcome::Ready { session, .. } => session,
            BootstrapOutcome::Degraded { session, .. } => session,
        }
    }

    pub fn alert(&self) -> Option<&AlertContent> {
        match self {
            BootstrapOutcome::Ready { .. } => None,
            BootstrapOutcome::Degraded { alert, .. } => Some(alert),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("bootstrap already started")]
    AlreadyStarted,
    #[error("could not access the stored session")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for BootstrapError {
    fn from(error: StorageError) -> Self {
        BootstrapError::Storage(error)
    }
}

pub struct Bootstrap<S, C, L> {
    session: SessionManager<S>,
    catalog: PackageCatalog<C>,
    logo_loader: L,
    logo_url: Option<String>,
    alert: AlertDialog,
    phase: watch::Sender<BootstrapPhase>,
    transitions: Vec<BootstrapPhase>,
}

impl<S, C, L> Bootstrap<S, C, L>
where
    S: SessionStore,
    C: CatalogTransport,
    L: LogoLoader,
{
    pub fn new(store: S, transport: C, logo_loader: L) -> Self {
        let (phase, _) = watch::channel(BootstrapPhase::Idle);
        Self {
            session: SessionManager::new(store),
            catalog: PackageCatalog::new(transport),
            logo_loader,
            logo_url: None,
            alert: AlertDialog::default(),
            phase,
            transitions: Vec::new(),
        }
    }

    /// Receive every phase change from now on.
    pub fn subscribe(&self) -> watch::Receiver<BootstrapPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> BootstrapPhase {
        *self.phase.borrow()
    }

    /// All phases entered so far, in order.
    pub fn transitions(&self) -> &[BootstrapPhase] {
        &self.transitions
    }

    pub fn is_loading(&self) -> bool {
        !matches!(self.phase(), BootstrapPhase::Idle | BootstrapPhase::Ready)
    }

    fn enter(&mut self, phase: BootstrapPhase) {
        debug!(?phase, "bootstrap phase");
        self.transitions.push(phase);
        self.phase.send_replace(phase);
    }

    /// Run the startup sequence once.
    ///
    /// Only storage failures abort the sequence.
    #[instrument(skip_all)]
    pub async fn run(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.phase() != BootstrapPhase::Idle {
            return Err(BootstrapError::AlreadyStarted);
        }
        self.enter(BootstrapPhase::Loading);

        match self.logo_loader.load_logo().await {
            Ok(url) if !url.is_empty() => self.logo_url = Some(url),
            Ok(_) => debug!("registry has no logo"),
            Err(e) => warn!(error = %e, "could not load the registry logo"),
        }

        self.enter(BootstrapPhase::SessionRestoring);
        let session = self.session.restore()?;
        if session.is_authenticated() {
            self.enter(BootstrapPhase::SessionReady);
        } else {
            self.enter(BootstrapPhase::SessionAnonymous);
        }

        self.enter(BootstrapPhase::CatalogLoading);
        let loaded = self.catalog.load(session.token()).await.map(Catalog::clone);
        let outcome = match loaded {
            Ok(catalog) => {
                self.enter(BootstrapPhase::CatalogReady);
                BootstrapOutcome::Ready { session, catalog }
            },
            Err(e) => {
                warn!(error = %e, "catalog unavailable");
                let alert = e.to_alert();
                self.alert.show(alert.clone());
                self.enter(BootstrapPhase::CatalogFailed);
                BootstrapOutcome::Degraded { session, alert }
            },
        };

        self.enter(BootstrapPhase::Ready);
        info!(packages = self.catalog.current().len(), "ready");
        Ok(outcome)
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    /// For login and logout once the bootstrap is done.
    pub fn session_mut(&mut self) -> &mut SessionManager<S> {
        &mut self.session
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.current()
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn alert(&self) -> &AlertDialog {
        &self.alert
    }

    pub fn alert_mut(&mut self) -> &mut AlertDialog {
        &mut self.alert
    }
}
