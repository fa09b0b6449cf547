//! Session, catalog and search logic of the registry browser.
//!
//! The crate is split the same way as the application is wired:
//! - [providers] holds the collaborator contracts (session storage, login,
//!   catalog transport, logo) and their implementations
//! - [models] holds the state owned by the browser: the session, the
//!   package catalog, the search engine and the bootstrap sequence

pub mod models;
pub mod providers;

pub use registry_client;
