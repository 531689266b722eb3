/// Integration tests for database module
///
/// Tests the complete database lifecycle including:
/// - Database creation and initialization
/// - WAL mode configuration
/// - Manifest document constraints
/// - Durability of appended entries across reopen
use codepin_engine::db::{Database, ManifestEntry, ManifestStore};
use codepin_engine::storage::UploadReceipt;
use tempfile::TempDir;

fn receipt(name: &str, cid: &str) -> UploadReceipt {
    UploadReceipt {
        id: format!("id-{}", name),
        name: name.to_string(),
        cid: cid.to_string(),
        size: 10,
        mime_type: "text/javascript".to_string(),
        created_at: None,
        extra: serde_json::Map::new(),
    }
}

#[tokio::test]
async fn test_database_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("codepin.db");

    let db = Database::new(&db_path).await.unwrap();

    assert!(db_path.exists());

    // WAL file exists while the pool is open
    let wal_path = temp_dir.path().join("codepin.db-wal");
    assert!(wal_path.exists());

    let result = sqlx::query("SELECT COUNT(*) as count FROM manifest_documents")
        .fetch_one(db.pool())
        .await;
    assert!(result.is_ok());

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_manifests_must_be_json_array() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("codepin.db"))
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO manifest_documents (owner, manifests, created_at) VALUES (?, ?, ?)",
    )
    .bind("broken")
    .bind("{\"not\":\"an array\"}")
    .bind(1234567890i64)
    .execute(db.pool())
    .await;
    assert!(result.is_err());

    let result = sqlx::query(
        "INSERT INTO manifest_documents (owner, manifests, created_at) VALUES (?, ?, ?)",
    )
    .bind("garbage")
    .bind("not json")
    .bind(1234567890i64)
    .execute(db.pool())
    .await;
    assert!(result.is_err());

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("codepin.db");

    {
        let db = Database::new(&db_path).await.unwrap();
        let repo = db.manifests();
        repo.ensure_owner("system").await.unwrap();

        let entry = ManifestEntry::new(
            "0xABC",
            "demo",
            vec![receipt("README.md", "cid-readme"), receipt("index.js", "cid-index")],
        );
        repo.push_manifest("system", &entry).await.unwrap();
        db.close().await.unwrap();
    }

    let db = Database::new(&db_path).await.unwrap();
    let entries = db.manifests().manifests("system").await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].owner, "0xABC");
    assert_eq!(entries[0].uploads[1].cid, "cid-index");

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_documents_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("codepin.db"))
        .await
        .unwrap();
    let repo = db.manifests();

    repo.ensure_owner("system").await.unwrap();
    repo.ensure_owner("staging").await.unwrap();

    repo.push_manifest("staging", &ManifestEntry::new("0xABC", "demo", Vec::new()))
        .await
        .unwrap();

    assert!(repo.manifests("system").await.unwrap().is_empty());
    assert_eq!(repo.manifests("staging").await.unwrap().len(), 1);
    assert!(repo.manifests("unknown").await.unwrap().is_empty());

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_backend_receipt_fields_are_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("codepin.db"))
        .await
        .unwrap();
    let repo = db.manifests();
    repo.ensure_owner("system").await.unwrap();

    let mut upload = receipt("index.js", "cid-index");
    upload
        .extra
        .insert("number_of_files".to_string(), serde_json::json!(1));
    upload.extra.insert(
        "keyvalues".to_string(),
        serde_json::json!({ "folder": "demo" }),
    );

    repo.push_manifest("system", &ManifestEntry::new("0xABC", "demo", vec![upload]))
        .await
        .unwrap();

    let entries = repo.manifests("system").await.unwrap();
    let stored = &entries[0].uploads[0];
    assert_eq!(stored.extra["number_of_files"], 1);
    assert_eq!(stored.extra["keyvalues"]["folder"], "demo");

    db.close().await.unwrap();
}
