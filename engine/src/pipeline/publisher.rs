//! Publisher
//!
//! Uploads a synthesized README plus every generated file to the content
//! store. Uploads run concurrently and the publisher waits for all of them;
//! receipts come back in input order (README first), regardless of the order
//! uploads finish in.
//!
//! Publishing is all-or-nothing: one failed upload fails the whole publish.
//! Files that did upload are left in the store unreferenced and are reported
//! in a warning; they are not deleted.

use futures::future::join_all;
use sdk::errors::PipelineError;
use sdk::types::ProjectFile;
use std::sync::Arc;

use crate::storage::{ContentStore, UploadFile, UploadReceipt};

/// File name of the synthesized README
pub const README_NAME: &str = "README.md";

const README_CONTENT_TYPE: &str = "text/plain";
const DATA_CONTENT_TYPE: &str = "application/json";
const SOURCE_CONTENT_TYPE: &str = "text/javascript";

pub struct Publisher {
    store: Arc<dyn ContentStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// README announcing the target folder
    pub fn readme(folder: &str) -> ProjectFile {
        ProjectFile::new(README_NAME, format!("### Repository: {}", folder))
    }

    /// Content type of a generated file, inferred from its extension
    pub fn content_type_for(name: &str) -> &'static str {
        let is_data = name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("json"));

        if is_data {
            DATA_CONTENT_TYPE
        } else {
            SOURCE_CONTENT_TYPE
        }
    }

    /// Upload `readme` followed by `files`.
    ///
    /// Returns one receipt per file: `receipts[0]` is the README, and
    /// `receipts[i + 1]` belongs to `files[i]`.
    pub async fn publish(
        &self,
        readme: &ProjectFile,
        files: &[ProjectFile],
    ) -> Result<Vec<UploadReceipt>, PipelineError> {
        let uploads: Vec<UploadFile> =
            std::iter::once(UploadFile::new(
                readme.name.clone(),
                readme.content.clone(),
                README_CONTENT_TYPE,
            ))
            .chain(files.iter().map(|file| {
                UploadFile::new(
                    file.name.clone(),
                    file.content.clone(),
                    Self::content_type_for(&file.name),
                )
            }))
            .collect();

        tracing::debug!(
            "Publishing {} files to {}",
            uploads.len(),
            self.store.name()
        );

        let results = join_all(uploads.iter().map(|file| self.store.upload(file))).await;

        let mut receipts = Vec::with_capacity(uploads.len());
        let mut failures = Vec::new();
        for (file, result) in uploads.iter().zip(results) {
            match result {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    tracing::error!("Upload of '{}' failed: {}", file.name, e);
                    failures.push(format!("{}: {}", file.name, e));
                }
            }
        }

        if !failures.is_empty() {
            if !receipts.is_empty() {
                let orphaned: Vec<&str> = receipts.iter().map(|r| r.cid.as_str()).collect();
                tracing::warn!(
                    "{} uploaded file(s) left unreferenced after failed publish: {:?}",
                    orphaned.len(),
                    orphaned
                );
            }

            return Err(PipelineError::Storage(format!(
                "{} of {} uploads failed: {}",
                failures.len(),
                uploads.len(),
                failures.join("; ")
            )));
        }

        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Fails one named file; the others complete in reverse input order
    struct FlakyStore {
        inner: MemoryStore,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl ContentStore for FlakyStore {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, StorageError> {
            // Later files finish first
            let delay = 40u64.saturating_sub(file.name.len() as u64 * 4);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_on.as_deref() == Some(file.name.as_str()) {
                return Err(StorageError::Rejected {
                    name: file.name.clone(),
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            self.inner.upload(file).await
        }
    }

    fn files() -> Vec<ProjectFile> {
        vec![
            ProjectFile::new("a.js", "1"),
            ProjectFile::new("bb.json", "{}"),
            ProjectFile::new("ccc.mjs", "3"),
        ]
    }

    #[test]
    fn test_readme_content() {
        let readme = Publisher::readme("demo");
        assert_eq!(readme.name, "README.md");
        assert_eq!(readme.content, "### Repository: demo");
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(Publisher::content_type_for("package.json"), "application/json");
        assert_eq!(Publisher::content_type_for("DATA.JSON"), "application/json");
        assert_eq!(Publisher::content_type_for("index.js"), "text/javascript");
        assert_eq!(Publisher::content_type_for("json"), "text/javascript");
        assert_eq!(Publisher::content_type_for("notes.jsonl"), "text/javascript");
    }

    #[tokio::test]
    async fn test_receipts_preserve_input_order() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_on: None,
        });
        let publisher = Publisher::new(store);

        let receipts = publisher
            .publish(&Publisher::readme("demo"), &files())
            .await
            .unwrap();

        let names: Vec<&str> = receipts.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["README.md", "a.js", "bb.json", "ccc.mjs"]);
        assert_eq!(receipts[0].mime_type, "text/plain");
        assert_eq!(receipts[2].mime_type, "application/json");
        assert_eq!(receipts[3].mime_type, "text/javascript");
    }

    #[tokio::test]
    async fn test_single_failure_fails_publish_after_all_complete() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_on: Some("bb.json".to_string()),
        });
        let publisher = Publisher::new(store.clone());

        let err = publisher
            .publish(&Publisher::readme("demo"), &files())
            .await
            .unwrap_err();

        match err {
            PipelineError::Storage(msg) => {
                assert!(msg.starts_with("1 of 4 uploads failed"));
                assert!(msg.contains("bb.json"));
            }
            other => panic!("Expected StorageError, got: {:?}", other),
        }

        // Siblings ran to completion and are now orphaned
        assert_eq!(store.inner.upload_count(), 3);
    }
}
