//! Manifest Recorder
//!
//! Builds the manifest entry for a published project and appends it to the
//! configured owner document.

use sdk::errors::PipelineError;
use std::sync::Arc;

use crate::db::{ManifestEntry, ManifestStore};
use crate::storage::UploadReceipt;

pub struct ManifestRecorder {
    store: Arc<dyn ManifestStore>,
    owner_key: String,
}

impl ManifestRecorder {
    pub fn new(store: Arc<dyn ManifestStore>, owner_key: impl Into<String>) -> Self {
        Self {
            store,
            owner_key: owner_key.into(),
        }
    }

    /// Key of the document entries are appended to
    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    /// Append one entry for `owner`/`folder` with the given receipts
    pub async fn record(
        &self,
        owner: &str,
        folder: &str,
        uploads: Vec<UploadReceipt>,
    ) -> Result<ManifestEntry, PipelineError> {
        let entry = ManifestEntry::new(owner, folder, uploads);

        self.store
            .push_manifest(&self.owner_key, &entry)
            .await
            .map_err(|e| PipelineError::Persistence(format!("{:#}", e)))?;

        tracing::info!(
            "Recorded manifest for '{}' ({} uploads)",
            entry.folder,
            entry.uploads.len()
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_record_appends_entry() {
        let db = Database::in_memory().await.unwrap();
        let repo = Arc::new(db.manifests());
        repo.ensure_owner("system").await.unwrap();

        let recorder = ManifestRecorder::new(repo.clone(), "system");
        let entry = recorder.record("0xABC", "demo", Vec::new()).await.unwrap();

        assert_eq!(entry.owner, "0xABC");
        assert!(entry.is_latest);

        let stored = repo.manifests("system").await.unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[tokio::test]
    async fn test_missing_document_is_persistence_error() {
        let db = Database::in_memory().await.unwrap();
        let recorder = ManifestRecorder::new(Arc::new(db.manifests()), "system");

        match recorder.record("0xABC", "demo", Vec::new()).await.unwrap_err() {
            PipelineError::Persistence(msg) => assert!(msg.contains("No manifest document")),
            other => panic!("Expected PersistenceError, got: {:?}", other),
        }
    }
}
