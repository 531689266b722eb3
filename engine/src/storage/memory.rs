use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ContentStore, StorageError, UploadFile, UploadReceipt};

/// In-memory content-addressed store.
///
/// The content identifier is the BLAKE3 digest of the file bytes, so two
/// uploads of the same content share a `cid` while still getting distinct
/// upload ids.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<String, UploadFile>,
    receipts: Vec<UploadReceipt>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content identifier for `content`
    pub fn cid_for(content: &str) -> String {
        format!("b3-{}", blake3::hash(content.as_bytes()).to_hex())
    }

    /// Look up a stored file by content identifier
    pub fn get(&self, cid: &str) -> Option<UploadFile> {
        let state = self.inner.lock().expect("MemoryStore lock poisoned");
        state.blobs.get(cid).cloned()
    }

    /// Number of uploads accepted so far
    pub fn upload_count(&self) -> usize {
        let state = self.inner.lock().expect("MemoryStore lock poisoned");
        state.receipts.len()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, StorageError> {
        let cid = Self::cid_for(&file.content);

        let mut state = self.inner.lock().expect("MemoryStore lock poisoned");
        let receipt = UploadReceipt {
            id: format!("mem-{}", state.receipts.len() + 1),
            name: file.name.clone(),
            cid: cid.clone(),
            size: file.content.len() as u64,
            mime_type: file.content_type.clone(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            extra: serde_json::Map::new(),
        };

        state.blobs.insert(cid, file.clone());
        state.receipts.push(receipt.clone());

        Ok(receipt)
    }
}
