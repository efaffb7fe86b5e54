// # File Local Store
//
// File-based implementation of LocalStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "domains": {
//     "example.com": [
//       {
//         "id": "6f1c1b4e-...",
//         "remote_id": "372e67954025e0ba6aaa6d586b9e0b59",
//         "record_type": "A",
//         "name": "www.example.com",
//         "content": "198.51.100.4",
//         "ttl": 300,
//         "priority": null,
//         "proxied": true,
//         "last_synced": "2025-01-09T12:00:00Z"
//       }
//     ]
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::apply_changes;
use crate::Error;
use crate::config::LocalStoreConfig;
use crate::reconcile::ChangeSet;
use crate::record::LocalRecord;
use crate::traits::local_store::{LocalStore, LocalStoreFactory};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-based local store with crash recovery
///
/// # Crash Recovery
///
/// - **Atomic writes**: New state written to temporary file, then renamed
/// - **Backup**: Last known good state kept in `.backup` file
/// - **Corruption detection**: JSON validation on load
/// - **Automatic recovery**: Falls back to backup if main file corrupted
///
/// # Example
///
/// ```rust,no_run
/// use dnsmirror_core::state::FileLocalStore;
/// use dnsmirror_core::traits::LocalStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileLocalStore::new("/var/lib/dnsmirror/records.json").await?;
///     let records = store.snapshot("example.com").await?;
///     println!("{} records mirrored", records.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    domains: HashMap<String, Vec<LocalRecord>>,
    dirty: bool,
}

/// Serializable store file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    domains: HashMap<String, Vec<LocalRecord>>,
}

impl FileLocalStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Try to load the existing store file
    /// 2. If corruption is detected, try to load from backup
    /// 3. If both fail, start empty
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let domains = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                domains,
                dirty: false,
            })),
        })
    }

    /// Load from file, falling back to the backup when the main file is corrupted
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, Vec<LocalRecord>>, Error> {
        let err = match Self::load(path).await {
            Ok(domains) => {
                tracing::debug!("Loaded local store: {} domains", domains.len());
                return Ok(domains);
            }
            Err(err) => err,
        };

        // Read failures are not corruption; only parse failures are recovered from
        if !matches!(err, Error::Json(_)) {
            return Err(err);
        }

        tracing::warn!(
            "Store file appears corrupted: {}. Attempting recovery from backup.",
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty store.");
            return Ok(HashMap::new());
        }

        match Self::load(&backup_path).await {
            Ok(domains) => {
                tracing::info!("Recovered local store from backup: {} domains", domains.len());
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore store file from backup: {}", restore_err);
                }
                Ok(domains)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with empty store.",
                    backup_err
                );
                Ok(HashMap::new())
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, Vec<LocalRecord>>, Error> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::local_store(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content)?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.domains)
    }

    /// Write the current state atomically and mark it clean
    async fn write(&self) -> Result<(), Error> {
        let mut guard = self.state.write().await;
        self.persist(&guard.domains).await?;
        guard.dirty = false;
        Ok(())
    }

    /// Write `domains` via temp file and rename; callers hold the state lock
    async fn persist(&self, domains: &HashMap<String, Vec<LocalRecord>>) -> Result<(), Error> {
        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            domains: domains.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::local_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await?;
            temp.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::local_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Local store written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Force immediate write to disk
    pub async fn sync(&self) -> Result<(), Error> {
        self.write().await
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn snapshot(&self, domain: &str) -> Result<Vec<LocalRecord>, Error> {
        let guard = self.state.read().await;
        Ok(guard.domains.get(domain).cloned().unwrap_or_default())
    }

    async fn apply(&self, domain: &str, changes: &ChangeSet) -> Result<(), Error> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut guard = self.state.write().await;
        let current = guard.domains.get(domain).map(Vec::as_slice).unwrap_or_default();
        let updated = apply_changes(current, changes)?;

        // Memory only moves forward once the new state is on disk
        let mut domains = guard.domains.clone();
        domains.insert(domain.to_string(), updated);
        self.persist(&domains).await?;

        guard.domains = domains;
        guard.dirty = false;
        Ok(())
    }

    async fn list_domains(&self) -> Result<Vec<String>, Error> {
        let guard = self.state.read().await;
        Ok(guard.domains.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write().await } else { Ok(()) }
    }
}

/// Factory for [`FileLocalStore`]
pub struct FileLocalStoreFactory;

#[async_trait]
impl LocalStoreFactory for FileLocalStoreFactory {
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn LocalStore>, Error> {
        match serde_json::from_value::<LocalStoreConfig>(config.clone())? {
            LocalStoreConfig::File { path } if !path.is_empty() => {
                Ok(Box::new(FileLocalStore::new(path).await?))
            }
            LocalStoreConfig::File { .. } => Err(Error::config("File store path cannot be empty")),
            _ => Err(Error::config("Invalid config for file local store")),
        }
    }
}
