//! Knowledge snapshot files.
//!
//! A snapshot is pretty-printed JSON. Saving writes a sibling temp file and
//! renames it over the target, so a crash mid-write never leaves a truncated
//! snapshot behind.

use std::path::{Path, PathBuf};

use storytailor_types::document::KnowledgeSnapshot;
use storytailor_types::error::GroundingError;

/// Write `snapshot` to `path` atomically, creating parent directories.
pub async fn save_snapshot(path: &Path, snapshot: &KnowledgeSnapshot) -> Result<(), GroundingError> {
    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| GroundingError::Snapshot(format!("failed to serialize snapshot: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error("create directory", parent, e))?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| io_error("write", &tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_error("rename", path, e));
    }

    tracing::info!(
        path = %path.display(),
        documents = snapshot.documents.len(),
        "saved knowledge snapshot"
    );
    Ok(())
}

/// Read a snapshot from `path`. A missing file is `Ok(None)`.
///
/// The snapshot is validated before it is returned.
pub async fn load_snapshot(path: &Path) -> Result<Option<KnowledgeSnapshot>, GroundingError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No snapshot at {}, starting empty", path.display());
            return Ok(None);
        }
        Err(e) => return Err(io_error("read", path, e)),
    };

    let snapshot: KnowledgeSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
        GroundingError::Snapshot(format!("failed to parse {}: {e}", path.display()))
    })?;
    snapshot.validate()?;

    tracing::debug!(
        path = %path.display(),
        documents = snapshot.documents.len(),
        "loaded knowledge snapshot"
    );
    Ok(Some(snapshot))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> GroundingError {
    GroundingError::Snapshot(format!("failed to {action} {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storytailor_types::document::{DocumentId, DocumentRecord, SNAPSHOT_VERSION};
    use tempfile::TempDir;

    fn snapshot() -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: 3,
            embedding_model: Some("feature-hash-v1".to_string()),
            documents: vec![
                DocumentRecord {
                    id: DocumentId::new(),
                    text: "Rabbits can run up to 70 km/h.".to_string(),
                    source: "Animal Encyclopedia".to_string(),
                    embedding: vec![0.1, 0.2, 0.3],
                    added_at: Utc::now(),
                },
                DocumentRecord {
                    id: DocumentId::new(),
                    text: "Foxes live in forests.".to_string(),
                    source: "Forest Ecology".to_string(),
                    embedding: vec![-0.5, 0.0, 0.8660254],
                    added_at: Utc::now(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn save_then_load_is_exact() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("knowledge.json");
        let original = snapshot();

        save_snapshot(&path, &original).await.unwrap();
        let loaded = load_snapshot(&path).await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn load_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_snapshot(&tmp.path().join("none.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_corrupt_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(
            load_snapshot(&path).await,
            Err(GroundingError::Snapshot(_))
        ));
    }

    #[tokio::test]
    async fn load_inconsistent_snapshot_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        let mut bad = snapshot();
        bad.documents[1].embedding = vec![1.0];
        tokio::fs::write(&path, serde_json::to_vec(&bad).unwrap()).await.unwrap();
        assert!(matches!(
            load_snapshot(&path).await,
            Err(GroundingError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn save_overwrites_existing_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        save_snapshot(&path, &snapshot()).await.unwrap();

        let mut smaller = snapshot();
        smaller.documents.truncate(1);
        save_snapshot(&path, &smaller).await.unwrap();
        assert_eq!(load_snapshot(&path).await.unwrap().unwrap().documents.len(), 1);
    }
}
