/// Manifest persistence operations
///
/// Every successful pipeline run appends one `ManifestEntry` to the JSON
/// array held by a single owner document. The append is one UPDATE statement,
/// so concurrent runs never lose an entry, but their relative order is
/// whatever order SQLite serializes the writes in.
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::storage::UploadReceipt;

/// Durable record of one generation-and-publish run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Identity the project was generated for (wallet address)
    #[serde(rename = "id")]
    pub owner: String,

    pub folder: String,

    /// README receipt first, then one receipt per generated file
    pub uploads: Vec<UploadReceipt>,

    /// Set on every new entry; earlier entries are left untouched
    pub is_latest: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ManifestEntry {
    pub fn new(
        owner: impl Into<String>,
        folder: impl Into<String>,
        uploads: Vec<UploadReceipt>,
    ) -> Self {
        Self {
            owner: owner.into(),
            folder: folder.into(),
            uploads,
            is_latest: true,
            created_at: Utc::now(),
        }
    }
}

/// Append-only store of manifest entries keyed by owner document
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Append `entry` to the tail of the document's `manifests` list.
    ///
    /// Fails when no document exists for `owner_key`; the document is never
    /// created here.
    async fn push_manifest(&self, owner_key: &str, entry: &ManifestEntry) -> Result<()>;

    /// All entries of a document, oldest first
    async fn manifests(&self, owner_key: &str) -> Result<Vec<ManifestEntry>>;

    /// Create an empty document for `owner_key` if none exists.
    ///
    /// Returns true when a document was created.
    async fn ensure_owner(&self, owner_key: &str) -> Result<bool>;
}

/// SQLite-backed manifest store
#[derive(Clone)]
pub struct ManifestRepository {
    pool: SqlitePool,
}

impl ManifestRepository {
    /// Create a new manifest repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Entries recorded for one identity, newest first
    pub async fn entries_for(
        &self,
        owner_key: &str,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<ManifestEntry>> {
        let mut entries: Vec<ManifestEntry> = self
            .manifests(owner_key)
            .await?
            .into_iter()
            .filter(|entry| entry.owner == identity)
            .collect();

        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Whether a document exists for `owner_key`
    pub async fn owner_exists(&self, owner_key: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM manifest_documents WHERE owner = ?")
                .bind(owner_key)
                .fetch_one(&self.pool)
                .await
                .context("Failed to look up manifest document")?;

        Ok(count > 0)
    }
}

#[async_trait]
impl ManifestStore for ManifestRepository {
    async fn push_manifest(&self, owner_key: &str, entry: &ManifestEntry) -> Result<()> {
        let json = serde_json::to_string(entry).context("Failed to serialize manifest entry")?;

        // '$[#]' addresses the slot one past the end of the array
        let result = sqlx::query(
            "UPDATE manifest_documents SET manifests = json_insert(manifests, '$[#]', json(?)) WHERE owner = ?",
        )
        .bind(&json)
        .bind(owner_key)
        .execute(&self.pool)
        .await
        .context("Failed to append manifest entry")?;

        if result.rows_affected() == 0 {
            bail!("No manifest document for owner '{}'", owner_key);
        }

        Ok(())
    }

    async fn manifests(&self, owner_key: &str) -> Result<Vec<ManifestEntry>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT manifests FROM manifest_documents WHERE owner = ?")
                .bind(owner_key)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load manifest document")?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).context("Manifest document is corrupt"),
            None => Ok(Vec::new()),
        }
    }

    async fn ensure_owner(&self, owner_key: &str) -> Result<bool> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO manifest_documents (owner, manifests, created_at) VALUES (?, '[]', ?)",
        )
        .bind(owner_key)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create manifest document")?;

        Ok(result.rows_affected() == 1)
    }
}
