//! Credential storage behind the API client.
//!
//! The client only ever touches the `token` key. [`FileStore`] keeps it in a
//! TOML table so other keys written by the consuming application survive a
//! `clear`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::RwLock;

use thiserror::Error;

pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read credential store {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write credential store {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid credential store {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to encode credential store: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("credential store lock poisoned")]
    Poisoned,
}

/// Get/set/clear access to the bearer credential.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StoreError>;
    fn set(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store; nothing survives a restart.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: RwLock<Option<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[cfg(test)]
impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        let guard = self.token.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let mut guard = self.token.write().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.token.write().map_err(|_| StoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(entries)?;
        std::fs::write(&self.path, content).map_err(write_err)?;
        restrict_permissions(&self.path);
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(TOKEN_KEY))
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}

/// Owner-only access for the credential file. No-op on non-Unix.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), error = %err, "could not restrict credential file");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
