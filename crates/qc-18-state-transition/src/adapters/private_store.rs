//! # Private Payload Stores
//!
//! Local implementations of the private transaction manager port. Payloads are
//! addressed by the keccak256 digest of their plaintext; that digest is the
//! reference carried on chain.
//!
//! A node that does not hold a payload is not a party to the transaction and
//! resolves its reference to an empty payload.

use crate::domain::services::keccak256;
use crate::domain::value_objects::{Bytes, Hash};
use crate::errors::{ConfigError, PrivateTxError};
use crate::ports::outbound::PrivateTransactionManager;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the private store config file.
pub const PRIVATE_CONFIG_ENV: &str = "PRIVATE_CONFIG";

fn parse_reference(reference: &[u8]) -> Result<Hash, PrivateTxError> {
    Hash::from_slice(reference).ok_or(PrivateTxError::InvalidReference {
        len: reference.len(),
    })
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Payload store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryPrivateStore {
    payloads: RwLock<HashMap<Hash, Bytes>>,
    failure: RwLock<Option<String>>,
}

impl InMemoryPrivateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `receive` fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write() = Some(reason.into());
    }

    /// Number of stored payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.read().len()
    }

    /// Returns true if no payload is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.read().is_empty()
    }
}

impl PrivateTransactionManager for InMemoryPrivateStore {
    fn send(&self, payload: &[u8], from: &str, to: &[String]) -> Result<Bytes, PrivateTxError> {
        let reference = keccak256(payload);
        debug!(%from, recipients = to.len(), reference = ?reference, "Storing private payload");
        self.payloads
            .write()
            .insert(reference, Bytes::from_slice(payload));
        Ok(Bytes::from_slice(reference.as_bytes()))
    }

    fn receive(&self, reference: &[u8]) -> Result<Bytes, PrivateTxError> {
        if let Some(reason) = self.failure.read().as_ref() {
            return Err(PrivateTxError::Transport(reason.clone()));
        }
        let reference = parse_reference(reference)?;
        Ok(self
            .payloads
            .read()
            .get(&reference)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// DIRECTORY STORE
// =============================================================================

/// Payload store backed by a directory, one file per payload named by the
/// hex reference.
#[derive(Debug, Clone)]
pub struct DirectoryPrivateStore {
    directory: PathBuf,
}

impl DirectoryPrivateStore {
    /// Opens (and creates if missing) the store directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, PrivateTxError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| PrivateTxError::Io {
            path: directory.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(Self { directory })
    }

    /// Store directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn payload_path(&self, reference: &Hash) -> PathBuf {
        self.directory.join(reference.to_hex())
    }
}

impl PrivateTransactionManager for DirectoryPrivateStore {
    fn send(&self, payload: &[u8], from: &str, to: &[String]) -> Result<Bytes, PrivateTxError> {
        let reference = keccak256(payload);
        let path = self.payload_path(&reference);
        debug!(%from, recipients = to.len(), path = %path.display(), "Writing private payload");
        fs::write(&path, payload).map_err(|e| PrivateTxError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(Bytes::from_slice(reference.as_bytes()))
    }

    fn receive(&self, reference: &[u8]) -> Result<Bytes, PrivateTxError> {
        let reference = parse_reference(reference)?;
        let path = self.payload_path(&reference);
        match fs::read(&path) {
            Ok(payload) => Ok(Bytes::from(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Bytes::new()),
            Err(e) => Err(PrivateTxError::Io {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }
}

// =============================================================================
// CONFIG LOADING
// =============================================================================

/// Private store configuration file.
///
/// ```toml
/// directory = "/var/lib/quantum-chain/private"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PrivateStoreConfig {
    /// Payload directory.
    pub directory: PathBuf,
}

impl PrivateStoreConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if the content is not valid TOML or lacks `directory`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Resolves the node's private transport.
///
/// An explicit command-line path wins; otherwise the path is taken from the
/// environment variable `env_var`. With neither set the node runs without a
/// private transport and `Ok(None)` is returned.
///
/// # Errors
///
/// Returns error if the config file cannot be read or the store cannot be
/// opened.
pub fn load_private_transport(
    cli_path: Option<&Path>,
    env_var: &str,
) -> Result<Option<DirectoryPrivateStore>, ConfigError> {
    let path = match cli_path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var(env_var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from),
    };

    let Some(path) = path else {
        debug!(env_var, "No private transport configured");
        return Ok(None);
    };

    info!(path = %path.display(), "Loading private transport config");
    let config = PrivateStoreConfig::load(&path)?;
    let store = DirectoryPrivateStore::open(&config.directory).map_err(|e| match e {
        PrivateTxError::Io { path, error } => ConfigError::Io { path, error },
        other => ConfigError::Io {
            path: config.directory.display().to_string(),
            error: other.to_string(),
        },
    })?;
    Ok(Some(store))
}

// =============================================================================
// TESTS
// =============================================================================
