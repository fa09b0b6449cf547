//! Persistence of the session fields.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::DocumentMut;
use tracing::{debug, trace};

/// The keys the session is persisted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    Username,
    Token,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Username => "username",
            SessionKey::Token => "token",
        }
    }
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not read session file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write session file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file '{}' is not valid TOML", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
    #[error("could not persist session file '{}'", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("{0}")]
    Other(String),
}

/// Key/value storage for the session fields.
///
/// Implementations hold no validation logic.
/// Removing a key that is not present must succeed.
pub trait SessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: SessionKey, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: SessionKey) -> Result<(), StorageError>;
}

/// A [SessionStore] backed by a TOML file.
///
/// The session fields are top-level keys of the document.
/// Other keys and comments in the file are left untouched.
/// A missing file reads as an empty session.
#[derive(Debug, Clone)]
pub struct TomlSessionStore {
    path: PathBuf,
}

impl TomlSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, `None` if the file does not exist.
    fn read_document(&self) -> Result<Option<DocumentMut>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "no session file");
                return Ok(None);
            },
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            },
        };

        let document = contents
            .parse::<DocumentMut>()
            .map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(document))
    }

    /// Write the document through a tempfile in the same directory,
    /// so that readers never observe a partially written file.
    fn write_document(&self, document: &DocumentMut) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error = |source: std::io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(write_error)?;
        let tempfile = tempfile::Builder::new()
            .tempfile_in(dir)
            .map_err(write_error)?;
        fs::write(&tempfile, document.to_string()).map_err(write_error)?;
        tempfile
            .persist(&self.path)
            .map_err(|source| StorageError::Persist {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "wrote session file");
        Ok(())
    }
}

impl SessionStore for TomlSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let Some(document) = self.read_document()? else {
            return Ok(None);
        };
        Ok(document
            .get(key.as_str())
            .and_then(|item| item.as_str())
            .map(ToString::to_string))
    }

    fn set(&mut self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(key.as_str(), toml_edit::value(value));
        self.write_document(&document)
    }

    fn remove(&mut self, key: SessionKey) -> Result<(), StorageError> {
        let Some(mut document) = self.read_document()? else {
            return Ok(());
        };
        if document.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write_document(&document)
    }
}
