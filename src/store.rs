use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The full persisted mapping from endpoint name to document, in insertion order
pub type Snapshot = Map<String, JsonValue>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot at {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot at {path:?} is not a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("failed to write snapshot at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The snapshot was read but its content is unusable
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. } | StoreError::NotAnObject { .. })
    }
}

/// Durable home of the endpoint snapshot.
///
/// Implementations must guarantee that `save` replaces the snapshot as one
/// unit, that saves are serialized, and that a read never observes a save
/// in progress.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Strict read of the persisted snapshot. Absent storage is an empty snapshot.
    async fn read_snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Atomically replace the persisted snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Verify the storage location is usable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Read the snapshot, substituting an empty one when storage is corrupt or unreadable.
    async fn load(&self) -> Snapshot {
        match self.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "endpoint snapshot unusable, continuing with an empty mapping");
                Snapshot::new()
            }
        }
    }

    /// Read the snapshot ahead of a load-mutate-save cycle.
    ///
    /// Corrupt content is replaced by an empty snapshot as in `load`, but a
    /// snapshot that cannot be read at all is an error: saving over it would
    /// discard every endpoint it still holds.
    async fn load_for_update(&self) -> Result<Snapshot, StoreError> {
        match self.read_snapshot().await {
            Err(err) if err.is_corruption() => {
                tracing::warn!(error = %err, "endpoint snapshot corrupt, the next save replaces it");
                Ok(Snapshot::new())
            }
            other => other,
        }
    }
}

/// Snapshot persisted as a single pretty-printed JSON file
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn temp_path(&self) -> PathBuf {
        self.path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()))
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

async fn discard_temp(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        tracing::debug!(error = %err, "Could not remove temp file {}", path.display());
    }
}

async fn write_synced(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(payload).await?;
    file.sync_all().await
}

fn parse_snapshot(path: &Path, bytes: &[u8]) -> Result<Snapshot, StoreError> {
    let value: JsonValue = serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        JsonValue::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn read_snapshot(&self) -> Result<Snapshot, StoreError> {
        let _guard = self.lock.read().await;

        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(Snapshot::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        parse_snapshot(&self.path, &bytes)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;

        let _guard = self.lock.write().await;

        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_error(source))?;
        }

        // Readers only ever see the old file or the fully written new one.
        let temp_path = self.temp_path();
        if let Err(source) = write_synced(&temp_path, &payload).await {
            discard_temp(&temp_path).await;
            return Err(self.write_error(source));
        }
        if let Err(source) = fs::rename(&temp_path, &self.path).await {
            discard_temp(&temp_path).await;
            return Err(self.write_error(source));
        }

        tracing::debug!(
            "Saved snapshot with {} endpoints to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => return Ok(()),
            Ok(_) => {
                return Err(StoreError::Unavailable(format!(
                    "{} is not a regular file",
                    self.path.display()
                )));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::Unavailable(err.to_string())),
        }

        // No snapshot yet: the first save creates it, so the directory only
        // needs to be usable (or creatable).
        let Some(parent) = self.parent_dir() else {
            return Ok(());
        };
        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                parent.display()
            ))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Unavailable(err.to_string())),
        }
    }
}
