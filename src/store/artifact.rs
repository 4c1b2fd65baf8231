//! Artifact identity and metadata types for the tiered data store.
//!
//! An artifact is the persisted output of one pipeline stage in one storage
//! tier. Identity is the (stage, tier) pair: the store keeps at most one
//! current artifact per key, and every artifact carries a manifest with
//! content fingerprints and the fingerprints of the inputs it was built from.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages that produce artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Synthetic dataset generation.
    Generate,
    /// Per-column profiling of the raw dataset.
    Profile,
    /// Feature preparation and derivation.
    Features,
    /// Cost-growth model fitting.
    Train,
}

impl StageId {
    /// All stages in pipeline execution order.
    pub const ALL: [StageId; 4] = [
        StageId::Generate,
        StageId::Profile,
        StageId::Features,
        StageId::Train,
    ];

    /// Stable directory-safe name for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Generate => "generate",
            StageId::Profile => "profile",
            StageId::Features => "features",
            StageId::Train => "train",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate" => Ok(StageId::Generate),
            "profile" => Ok(StageId::Profile),
            "features" => Ok(StageId::Features),
            "train" => Ok(StageId::Train),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// Storage tiers of the layered data store.
///
/// Tier directories form the external filesystem contract: raw data under the
/// data root, derived data in interim/processed subtrees, models and report
/// figures and logs in their own subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Raw,
    Interim,
    Processed,
    Model,
    Report,
    Log,
}

impl Tier {
    /// All tiers, raw first.
    pub const ALL: [Tier; 6] = [
        Tier::Raw,
        Tier::Interim,
        Tier::Processed,
        Tier::Model,
        Tier::Report,
        Tier::Log,
    ];

    /// Tiers cleared by the `clean` operation. The raw tier is never cleared.
    pub const CLEANABLE: [Tier; 5] = [
        Tier::Interim,
        Tier::Processed,
        Tier::Model,
        Tier::Report,
        Tier::Log,
    ];

    /// Stable name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Raw => "raw",
            Tier::Interim => "interim",
            Tier::Processed => "processed",
            Tier::Model => "model",
            Tier::Report => "report",
            Tier::Log => "log",
        }
    }

    /// Directory for this tier relative to the project root.
    pub fn relative_dir(&self) -> &'static str {
        match self {
            Tier::Raw => "data/raw",
            Tier::Interim => "data/interim",
            Tier::Processed => "data/processed",
            Tier::Model => "models",
            Tier::Report => "reports/figures",
            Tier::Log => "logs",
        }
    }

    /// Absolute directory for this tier under the given project root.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(self.relative_dir())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an artifact slot: one pipeline stage writing into one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub stage: StageId,
    pub tier: Tier,
}

impl ArtifactKey {
    pub fn new(stage: StageId, tier: Tier) -> Self {
        Self { stage, tier }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier, self.stage)
    }
}

/// One named file inside an artifact payload.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Payload handed to the store: a set of named files published together.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPayload {
    pub files: Vec<PayloadFile>,
}

impl ArtifactPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named file to the payload.
    pub fn with_file(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.push(PayloadFile {
            name: name.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// Convenience constructor for a single-file payload.
    pub fn single(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new().with_file(name, bytes)
    }
}

/// Provenance recorded alongside an artifact: the fingerprints of the declared
/// inputs it was derived from, and optionally a fingerprint of the parameters
/// that drove the producing stage. Staleness checks compare these against the
/// current state of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    /// Input artifact key (rendered `tier/stage`) to its fingerprint at build time.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    /// Fingerprint of the producing stage's parameters, when it has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an input artifact's fingerprint.
    pub fn with_input(mut self, key: ArtifactKey, fingerprint: impl Into<String>) -> Self {
        self.inputs.insert(key.to_string(), fingerprint.into());
        self
    }

    /// Records the producing stage's parameter fingerprint.
    pub fn with_params(mut self, fingerprint: impl Into<String>) -> Self {
        self.params = Some(fingerprint.into());
        self
    }

    /// Looks up the recorded fingerprint for an input key.
    pub fn input_fingerprint(&self, key: ArtifactKey) -> Option<&str> {
        self.inputs.get(&key.to_string()).map(String::as_str)
    }
}

/// Manifest persisted inside every artifact directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub stage: StageId,
    pub tier: Tier,
    /// Combined SHA-256 fingerprint over the payload files.
    pub fingerprint: String,
    /// Per-file SHA-256 checksums, keyed by file name.
    pub files: BTreeMap<String, String>,
    /// Provenance of this artifact (input and parameter fingerprints).
    #[serde(default)]
    pub provenance: Provenance,
    /// When the artifact was published.
    pub created_at: DateTime<Utc>,
}

/// A published artifact: manifest plus its on-disk location.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: ArtifactKey,
    /// Directory holding the payload files and the manifest.
    pub location: PathBuf,
    pub manifest: ArtifactManifest,
}

impl Artifact {
    /// Combined content fingerprint of this artifact.
    pub fn fingerprint(&self) -> &str {
        &self.manifest.fingerprint
    }

    /// Names of the payload files, in manifest (sorted) order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.files.keys().map(String::as_str)
    }

    /// Absolute path of a payload file.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.location.join(name)
    }
}
