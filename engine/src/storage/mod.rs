//! Content-Addressed Storage
//!
//! The publisher hands each generated file to a `ContentStore` and gets back
//! an `UploadReceipt` naming the content identifier the backend assigned.
//!
//! Backends:
//! - `pinata`: public IPFS pinning through the Pinata v3 upload API
//! - `memory`: in-process store keyed by BLAKE3 digest (tests, dry runs)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod pinata;

pub use memory::MemoryStore;
pub use pinata::PinataStore;

/// Errors that can occur while uploading a file
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Upload of '{name}' rejected ({status}): {body}")]
    Rejected {
        name: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload timed out")]
    Timeout,

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

/// A file ready to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content: String,
    pub content_type: String,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            content_type: content_type.into(),
        }
    }
}

/// Record returned by the storage backend for one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
    pub name: String,
    pub cid: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Any other fields the backend returned, persisted untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Storage backend trait
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the name of the backend (e.g., "pinata", "memory")
    fn name(&self) -> &str;

    /// Upload one file and return its receipt
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, StorageError>;
}

/// Public retrieval link for a receipt on a gateway host
///
/// Accepts a bare host ("example.mypinata.cloud") or a full URL.
pub fn gateway_url(gateway: &str, receipt: &UploadReceipt) -> String {
    let gateway = gateway.trim_end_matches('/');
    if gateway.starts_with("http://") || gateway.starts_with("https://") {
        format!("{}/ipfs/{}", gateway, receipt.cid)
    } else {
        format!("https://{}/ipfs/{}", gateway, receipt.cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> UploadReceipt {
        UploadReceipt {
            id: "01".to_string(),
            name: "index.js".to_string(),
            cid: "bafkreiabc".to_string(),
            size: 14,
            mime_type: "text/javascript".to_string(),
            created_at: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_gateway_url_bare_host() {
        assert_eq!(
            gateway_url("demo.mypinata.cloud", &receipt()),
            "https://demo.mypinata.cloud/ipfs/bafkreiabc"
        );
    }

    #[test]
    fn test_gateway_url_full_url() {
        assert_eq!(
            gateway_url("http://localhost:8080/", &receipt()),
            "http://localhost:8080/ipfs/bafkreiabc"
        );
    }

    #[test]
    fn test_receipt_tolerates_missing_optional_fields() {
        let parsed: UploadReceipt =
            serde_json::from_str(r#"{"id":"1","name":"a.js","cid":"bafy"}"#).unwrap();
        assert_eq!(parsed.size, 0);
        assert!(parsed.created_at.is_none());
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_receipt_keeps_unknown_backend_fields() {
        let body = r#"{"id":"1","name":"a.js","cid":"bafy","size":3,"group_id":null,"keyvalues":{"app":"codepin"},"number_of_files":1}"#;
        let parsed: UploadReceipt = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.extra["number_of_files"], 1);

        let stored = serde_json::to_value(&parsed).unwrap();
        assert_eq!(stored["keyvalues"]["app"], "codepin");
        assert!(stored["group_id"].is_null());
        assert_eq!(stored["number_of_files"], 1);
    }
}
