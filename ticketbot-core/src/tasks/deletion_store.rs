// File: ticketbot-core/src/tasks/deletion_store.rs
//
// Persistence for pending channel deletions, so a close acknowledged just
// before a restart is still carried out afterwards.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use ticketbot_common::models::PendingDeletion;

use crate::Error;

#[async_trait]
pub trait PendingDeletionStore: Send + Sync {
    /// Inserts or replaces the record for `record.channel_id`.
    async fn insert(&self, record: &PendingDeletion) -> Result<(), Error>;
    async fn get(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error>;
    async fn remove(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error>;
    async fn list(&self) -> Result<Vec<PendingDeletion>, Error>;
}

/// Keeps records for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryDeletionStore {
    records: DashMap<String, PendingDeletion>,
}

impl InMemoryDeletionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingDeletionStore for InMemoryDeletionStore {
    async fn insert(&self, record: &PendingDeletion) -> Result<(), Error> {
        self.records.insert(record.channel_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        Ok(self.records.get(channel_id).map(|r| r.value().clone()))
    }

    async fn remove(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        Ok(self.records.remove(channel_id).map(|(_, r)| r))
    }

    async fn list(&self) -> Result<Vec<PendingDeletion>, Error> {
        let mut all: Vec<PendingDeletion> =
            self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.due_at);
        Ok(all)
    }
}

/// Stores all records as one JSON array. Every write replaces the file
/// through a temporary sibling and a rename.
pub struct JsonFileDeletionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileDeletionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<PendingDeletion>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn write_all(&self, records: &[PendingDeletion]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} pending deletion(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl PendingDeletionStore for JsonFileDeletionStore {
    async fn insert(&self, record: &PendingDeletion) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.retain(|r| r.channel_id != record.channel_id);
        records.push(record.clone());
        self.write_all(&records).await
    }

    async fn get(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|r| r.channel_id == channel_id))
    }

    async fn remove(&self, channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let Some(pos) = records.iter().position(|r| r.channel_id == channel_id) else {
            return Ok(None);
        };
        let removed = records.remove(pos);
        self.write_all(&records).await?;
        Ok(Some(removed))
    }

    async fn list(&self) -> Result<Vec<PendingDeletion>, Error> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.sort_by_key(|r| r.due_at);
        Ok(all)
    }
}
