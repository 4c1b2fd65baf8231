//! Tiered artifact store for pipeline outputs.
//!
//! The store owns the on-disk project layout (`data/raw`, `data/interim`,
//! `data/processed`, `models`, `reports/figures`, `logs`) and keeps at most
//! one current artifact per (stage, tier) key. Artifacts are published
//! atomically: payload files and a manifest are written to a hidden temporary
//! directory inside the tier, fsynced, then renamed into place. A reader can
//! therefore never observe a partially written artifact, and an interrupted
//! publish leaves either the previous artifact or none.
//!
//! Writes to the same key are serialized through a per-key async mutex so
//! concurrent pipeline runs against one store cannot interleave publications.
//! Reads of already-published artifacts are unsynchronized.

pub mod artifact;

pub use artifact::{
    Artifact, ArtifactKey, ArtifactManifest, ArtifactPayload, PayloadFile, Provenance, StageId,
    Tier,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Name of the manifest file inside every artifact directory.
const MANIFEST_FILENAME: &str = "manifest.json";

/// Errors that can occur during artifact store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// No current artifact for the key.
    #[error("Artifact not found: {0}")]
    NotFound(ArtifactKey),

    /// The artifact directory exists but its contents are unusable.
    #[error("Corrupt artifact {key}: {reason}")]
    Corrupt { key: ArtifactKey, reason: String },

    /// A payload file's content does not match its recorded checksum.
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// The payload handed to `put` is unusable.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Storage directory creation failed.
    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Computes the SHA-256 checksum of data as lowercase hex.
pub(crate) fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Layered artifact store rooted at a project directory.
///
/// Artifacts live in per-stage subdirectories of their tier directory, e.g.
/// the raw dataset at `<root>/data/raw/generate/` and the feature table at
/// `<root>/data/processed/features/`.
pub struct ArtifactStore {
    root: PathBuf,
    /// Per-key publication locks; the outer mutex only guards the map itself.
    locks: Mutex<HashMap<ArtifactKey, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    /// Creates a store rooted at the given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the project root this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the current artifact for a key.
    pub fn artifact_dir(&self, key: ArtifactKey) -> PathBuf {
        key.tier.dir(&self.root).join(key.stage.as_str())
    }

    /// Fetches (or creates) the publication lock for a key.
    async fn key_lock(&self, key: ArtifactKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Publishes a payload as the current artifact for a key.
    ///
    /// The previous artifact for the key, if any, is replaced. Publication is
    /// atomic: the payload is staged in a hidden temporary directory and
    /// renamed into place, so readers see either the old artifact or the new
    /// one, never a mixture.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for empty payloads, duplicate or unsafe file
    /// names, and IO errors for filesystem failures.
    pub async fn put(
        &self,
        key: ArtifactKey,
        payload: ArtifactPayload,
        provenance: Provenance,
    ) -> Result<Artifact, StorageError> {
        validate_payload(&payload)?;

        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        let tier_dir = key.tier.dir(&self.root);
        fs::create_dir_all(&tier_dir).await.map_err(|e| {
            StorageError::DirectoryCreationFailed(format!(
                "Failed to create tier directory {:?}: {}",
                tier_dir, e
            ))
        })?;

        let final_dir = self.artifact_dir(key);
        let tmp_dir = tier_dir.join(format!(".tmp-{}-{}", key.stage, Uuid::new_v4().simple()));
        fs::create_dir_all(&tmp_dir).await?;

        let manifest = match stage_payload(&tmp_dir, key, &payload, provenance).await {
            Ok(manifest) => manifest,
            Err(e) => {
                let _ = fs::remove_dir_all(&tmp_dir).await;
                return Err(e);
            }
        };

        // Replace-then-rename: an interruption here leaves old-or-none.
        if final_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&final_dir).await {
                let _ = fs::remove_dir_all(&tmp_dir).await;
                return Err(e.into());
            }
        }
        if let Err(e) = fs::rename(&tmp_dir, &final_dir).await {
            let _ = fs::remove_dir_all(&tmp_dir).await;
            return Err(e.into());
        }

        tracing::debug!(
            key = %key,
            fingerprint = %manifest.fingerprint,
            files = manifest.files.len(),
            "Published artifact"
        );

        Ok(Artifact {
            key,
            location: final_dir,
            manifest,
        })
    }

    /// Loads the current artifact for a key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no artifact has been published for the key and
    /// `Corrupt` when the directory exists but the manifest is unreadable or
    /// names payload files that are missing.
    pub async fn get(&self, key: ArtifactKey) -> Result<Artifact, StorageError> {
        let dir = self.artifact_dir(key);
        let manifest_path = dir.join(MANIFEST_FILENAME);

        let contents = match fs::read(&manifest_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key));
            }
            Err(e) => return Err(e.into()),
        };

        let manifest: ArtifactManifest =
            serde_json::from_slice(&contents).map_err(|e| StorageError::Corrupt {
                key,
                reason: format!("unreadable manifest: {}", e),
            })?;

        for name in manifest.files.keys() {
            if !dir.join(name).exists() {
                return Err(StorageError::Corrupt {
                    key,
                    reason: format!("missing payload file '{}'", name),
                });
            }
        }

        Ok(Artifact {
            key,
            location: dir,
            manifest,
        })
    }

    /// Returns whether a current artifact exists for the key.
    pub async fn exists(&self, key: ArtifactKey) -> bool {
        self.artifact_dir(key).join(MANIFEST_FILENAME).exists()
    }

    /// Reads one payload file of an artifact and verifies its checksum.
    pub async fn read_file(
        &self,
        artifact: &Artifact,
        name: &str,
    ) -> Result<Vec<u8>, StorageError> {
        let expected = artifact.manifest.files.get(name).ok_or_else(|| {
            StorageError::Corrupt {
                key: artifact.key,
                reason: format!("file '{}' not listed in manifest", name),
            }
        })?;

        let data = fs::read(artifact.file_path(name)).await?;
        let actual = compute_checksum(&data);
        if &actual != expected {
            return Err(StorageError::ChecksumMismatch {
                file: name.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(data)
    }

    /// Removes every artifact in the named tiers and returns how many were
    /// removed.
    ///
    /// Deletion is per artifact directory, so an interruption leaves each key
    /// with either its old artifact or nothing. Stray entries in a tier
    /// directory (abandoned temporaries, plain files such as log output) are
    /// removed without being counted. Tier directories themselves are kept.
    pub async fn invalidate(&self, tiers: &[Tier]) -> Result<usize, StorageError> {
        let mut removed = 0;

        for tier in tiers {
            let tier_dir = tier.dir(&self.root);
            if !tier_dir.exists() {
                continue;
            }

            let mut entries = fs::read_dir(&tier_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().into_owned();

                if path.is_dir() {
                    if let Ok(stage) = name.parse::<StageId>() {
                        let key = ArtifactKey::new(stage, *tier);
                        let lock = self.key_lock(key).await;
                        let _guard = lock.lock().await;
                        fs::remove_dir_all(&path).await?;
                        removed += 1;
                        tracing::debug!(key = %key, "Invalidated artifact");
                    } else {
                        fs::remove_dir_all(&path).await?;
                    }
                } else {
                    fs::remove_file(&path).await?;
                }
            }
        }

        Ok(removed)
    }
}

/// Writes payload files plus manifest into the staging directory.
async fn stage_payload(
    tmp_dir: &Path,
    key: ArtifactKey,
    payload: &ArtifactPayload,
    provenance: Provenance,
) -> Result<ArtifactManifest, StorageError> {
    let mut file_checksums = std::collections::BTreeMap::new();

    for file in &payload.files {
        let path = tmp_dir.join(&file.name);
        let mut out = fs::File::create(&path).await?;
        out.write_all(&file.bytes).await?;
        out.sync_all().await?;
        file_checksums.insert(file.name.clone(), compute_checksum(&file.bytes));
    }

    let fingerprint = combined_fingerprint(&file_checksums);
    let manifest = ArtifactManifest {
        stage: key.stage,
        tier: key.tier,
        fingerprint,
        files: file_checksums,
        provenance,
        created_at: Utc::now(),
    };

    let manifest_json = serde_json::to_vec_pretty(&manifest)?;
    let manifest_path = tmp_dir.join(MANIFEST_FILENAME);
    let mut out = fs::File::create(&manifest_path).await?;
    out.write_all(&manifest_json).await?;
    out.sync_all().await?;

    Ok(manifest)
}

/// Combined fingerprint over per-file checksums, order-independent via the
/// sorted map.
fn combined_fingerprint(files: &std::collections::BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (name, checksum) in files {
        hasher.update(name.as_bytes());
        hasher.update(b":");
        hasher.update(checksum.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Rejects payloads the store cannot publish safely.
fn validate_payload(payload: &ArtifactPayload) -> Result<(), StorageError> {
    if payload.files.is_empty() {
        return Err(StorageError::InvalidPayload(
            "payload must contain at least one file".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for file in &payload.files {
        if file.name.is_empty()
            || file.name.starts_with('.')
            || file.name.contains('/')
            || file.name.contains('\\')
        {
            return Err(StorageError::InvalidPayload(format!(
                "unsafe payload file name '{}'",
                file.name
            )));
        }
        if file.name == MANIFEST_FILENAME {
            return Err(StorageError::InvalidPayload(format!(
                "payload file name '{}' is reserved",
                MANIFEST_FILENAME
            )));
        }
        if !seen.insert(file.name.as_str()) {
            return Err(StorageError::InvalidPayload(format!(
                "duplicate payload file name '{}'",
                file.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn raw_key() -> ArtifactKey {
        ArtifactKey::new(StageId::Generate, Tier::Raw)
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"Hello, World!");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"Hello, World!"));
        assert_ne!(checksum, compute_checksum(b"Different data"));
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let payload = ArtifactPayload::new()
            .with_file("contracts.csv", b"contract_id\nCTR-000001\n".to_vec())
            .with_file("vendors.json", b"[]".to_vec());
        let artifact = store
            .put(raw_key(), payload, Provenance::new().with_params("p"))
            .await
            .unwrap();

        assert_eq!(artifact.location, tmp.path().join("data/raw/generate"));
        assert!(artifact.file_path("contracts.csv").exists());

        let loaded = store.get(raw_key()).await.unwrap();
        assert_eq!(loaded.fingerprint(), artifact.fingerprint());
        assert_eq!(loaded.manifest.provenance.params.as_deref(), Some("p"));

        let bytes = store.read_file(&loaded, "contracts.csv").await.unwrap();
        assert_eq!(bytes, b"contract_id\nCTR-000001\n");
    }

    #[tokio::test]
    async fn test_put_overwrites_single_current_artifact() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let first = store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"v1".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();
        let second = store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"v2".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();

        assert_ne!(first.fingerprint(), second.fingerprint());

        // Exactly one artifact directory remains in the tier.
        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("data/raw"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["generate".to_string()]);

        let loaded = store.get(raw_key()).await.unwrap();
        let bytes = store.read_file(&loaded, "data.csv").await.unwrap();
        assert_eq!(bytes, b"v2");
    }

    #[tokio::test]
    async fn test_deterministic_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let payload = || ArtifactPayload::single("data.csv", b"same bytes".to_vec());
        let a = store
            .put(raw_key(), payload(), Provenance::new())
            .await
            .unwrap();
        let b = store
            .put(raw_key(), payload(), Provenance::new())
            .await
            .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        match store.get(raw_key()).await {
            Err(StorageError::NotFound(key)) => assert_eq!(key, raw_key()),
            other => panic!("expected NotFound, got {:?}", other.map(|a| a.key)),
        }
        assert!(!store.exists(raw_key()).await);
    }

    #[tokio::test]
    async fn test_read_file_detects_tampering() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let artifact = store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"original".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();

        std::fs::write(artifact.file_path("data.csv"), b"tampered").unwrap();

        match store.read_file(&artifact, "data.csv").await {
            Err(StorageError::ChecksumMismatch { file, .. }) => assert_eq!(file, "data.csv"),
            other => panic!("expected ChecksumMismatch, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_missing_payload_file_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let artifact = store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"bytes".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();
        std::fs::remove_file(artifact.file_path("data.csv")).unwrap();

        assert!(matches!(
            store.get(raw_key()).await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalidate_clears_named_tiers_only() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"raw".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();
        store
            .put(
                ArtifactKey::new(StageId::Features, Tier::Interim),
                ArtifactPayload::single("prepared.csv", b"interim".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();
        store
            .put(
                ArtifactKey::new(StageId::Features, Tier::Processed),
                ArtifactPayload::single("features.csv", b"processed".to_vec()),
                Provenance::new(),
            )
            .await
            .unwrap();

        let removed = store
            .invalidate(&[Tier::Interim, Tier::Processed])
            .await
            .unwrap();
        assert_eq!(removed, 2);

        assert!(store.get(raw_key()).await.is_ok());
        assert!(
            !store
                .exists(ArtifactKey::new(StageId::Features, Tier::Interim))
                .await
        );
        assert!(
            !store
                .exists(ArtifactKey::new(StageId::Features, Tier::Processed))
                .await
        );
    }

    #[tokio::test]
    async fn test_invalidate_removes_stray_files_uncounted() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let logs_dir = Tier::Log.dir(tmp.path());
        std::fs::create_dir_all(&logs_dir).unwrap();
        std::fs::write(logs_dir.join("pipeline.log"), b"log line\n").unwrap();

        let removed = store.invalidate(&[Tier::Log]).await.unwrap();
        assert_eq!(removed, 0);
        assert!(!logs_dir.join("pipeline.log").exists());
        assert!(logs_dir.exists());
    }

    #[tokio::test]
    async fn test_invalid_payloads_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let cases = vec![
            ArtifactPayload::new(),
            ArtifactPayload::single("../escape.csv", b"x".to_vec()),
            ArtifactPayload::single(".hidden", b"x".to_vec()),
            ArtifactPayload::single(MANIFEST_FILENAME, b"x".to_vec()),
            ArtifactPayload::new()
                .with_file("dup.csv", b"a".to_vec())
                .with_file("dup.csv", b"b".to_vec()),
        ];

        for payload in cases {
            assert!(matches!(
                store.put(raw_key(), payload, Provenance::new()).await,
                Err(StorageError::InvalidPayload(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_failed_put_preserves_previous_artifact() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let published = store
            .put(
                raw_key(),
                ArtifactPayload::single("data.csv", b"v1 bytes".to_vec()),
                Provenance::new().with_params("p1"),
            )
            .await
            .unwrap();

        // Rejected before any filesystem work.
        assert!(matches!(
            store
                .put(raw_key(), ArtifactPayload::new(), Provenance::new())
                .await,
            Err(StorageError::InvalidPayload(_))
        ));

        // Passes validation but dies mid-staging: the name is over the
        // filesystem limit, so creating the payload file fails.
        let over_limit = "x".repeat(300);
        assert!(matches!(
            store
                .put(
                    raw_key(),
                    ArtifactPayload::single(over_limit, b"v2".to_vec()),
                    Provenance::new().with_params("p2"),
                )
                .await,
            Err(StorageError::Io(_))
        ));

        // The earlier artifact is still published, bytes intact.
        let loaded = store.get(raw_key()).await.unwrap();
        assert_eq!(loaded.fingerprint(), published.fingerprint());
        assert_eq!(loaded.manifest.provenance.params.as_deref(), Some("p1"));
        let bytes = store.read_file(&loaded, "data.csv").await.unwrap();
        assert_eq!(bytes, b"v1 bytes");

        // No staging leftovers in the tier.
        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("data/raw"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["generate".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_puts_serialize_per_key() {
        let tmp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(ArtifactStore::new(tmp.path()));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put(
                        ArtifactKey::new(StageId::Generate, Tier::Raw),
                        ArtifactPayload::single("data.csv", vec![i; 64]),
                        Provenance::new(),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Whatever write won, the published artifact is complete and readable.
        let artifact = store.get(raw_key()).await.unwrap();
        let bytes = store.read_file(&artifact, "data.csv").await.unwrap();
        assert_eq!(bytes.len(), 64);
        assert!(bytes.windows(2).all(|w| w[0] == w[1]));
    }
}
