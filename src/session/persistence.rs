use crate::env;
use crate::session::config::{SessionConfig, normalize_directory};
use crate::session::error::SessionError;
use crate::session::identifier;
use crate::session::record::SessionRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

/// Durable per-identifier record storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a record; absent or unreadable data yields an empty record
    async fn load(&self, id: &str) -> SessionRecord;

    /// Persist the complete record, replacing whatever was stored
    async fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Delete a record; failures are not reported
    async fn remove(&self, id: &str);
}

/// One JSON file per session at `<directory><id>.json`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    directory: String,
}

impl FileSessionStore {
    /// Open a store rooted at `directory`, creating it if needed
    pub fn new(directory: impl Into<String>) -> Result<Self, SessionError> {
        let directory = normalize_directory(directory.into());
        std::fs::create_dir_all(&directory)
            .map_err(|source| SessionError::io(&directory, source))?;

        Ok(Self { directory })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        Self::new(config.storage.directory.clone())
    }

    /// Normalized directory, ending with a path separator
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// File backing the given identifier
    pub fn record_path(&self, id: &str) -> PathBuf {
        env::record_file_path(&self.directory, id)
    }

    /// Identifiers that currently have a persisted record, sorted
    pub async fn ids(&self) -> Result<Vec<String>, SessionError> {
        let suffix = format!(".{}", env::session::RECORD_EXTENSION);
        let mut ids = Vec::new();

        let mut entries = async_fs::read_dir(&self.directory)
            .await
            .map_err(|source| SessionError::io(&self.directory, source))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| SessionError::io(&self.directory, source))?
        {
            if let Some(name) = entry.file_name().to_str()
                && let Some(id) = name.strip_suffix(&suffix)
                && identifier::is_valid(id)
            {
                ids.push(id.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Write to a sibling temp file, then rename it over `path`
    async fn write_atomic(&self, id: &str, path: &Path, bytes: &[u8]) -> Result<(), SessionError> {
        let temp_path = PathBuf::from(format!(
            "{}.{}.{}.tmp",
            self.directory,
            id,
            uuid::Uuid::new_v4()
        ));

        let result = async {
            let mut file = async_fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            async_fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(source) = result {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(SessionError::io(path, source));
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &str) -> SessionRecord {
        let path = self.record_path(id);

        let content = match async_fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No persisted session {}, starting empty", id);
                return SessionRecord::new(id);
            }
            Err(e) => {
                warn!("Failed to read session file {}: {}", path.display(), e);
                return SessionRecord::new(id);
            }
        };

        match serde_json::from_slice::<Value>(&content) {
            Ok(Value::Object(data)) => {
                debug!("Loaded session {} ({} keys)", id, data.len());
                SessionRecord::from_data(id, data)
            }
            Ok(_) => {
                warn!("Session file {} is not a JSON object, ignoring", path.display());
                SessionRecord::new(id)
            }
            Err(e) => {
                warn!("Session file {} is corrupt, ignoring: {}", path.display(), e);
                SessionRecord::new(id)
            }
        }
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let path = self.record_path(record.id());
        let serialized = serde_json::to_vec(record.data())?;

        self.write_atomic(record.id(), &path, &serialized)
            .await
            .inspect_err(|e| error!("Session save failed: {}", e))?;

        debug!(
            "Saved session {}: {} bytes",
            record.id(),
            serialized.len()
        );
        Ok(())
    }

    async fn remove(&self, id: &str) {
        let path = self.record_path(id);
        match async_fs::remove_file(&path).await {
            Ok(()) => debug!("Removed session file {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove session file {}: {}", path.display(), e),
        }
    }
}
