use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::pipeline::{MultinomialNb, TfidfVectorizer, TrainedPipeline};

/// Format tag written into every artifact envelope. Bump on any change to
/// the payload layout; artifacts carry no cross-version compatibility
/// guarantee.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default folder for curated datasets, relative to the working directory.
pub const DEFAULT_DATASET_DIR: &str = "./dataset";
/// Default folder for model artifacts, relative to the working directory.
pub const DEFAULT_MODEL_DIR: &str = "./model";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Artifact format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("Malformed curated table at line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },
}

/// Everything inference needs, persisted as one unit.
///
/// The vectorizer vocabulary, its IDF weights, the classifier parameters,
/// and the label vocabulary are trained together and corrupt silently when
/// they drift apart, so they persist together: one envelope with a format
/// version tag and a checksum over the payload. Reordering or regenerating
/// any piece independently is structurally impossible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub labels: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub classifier: MultinomialNb,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    checksum: String,
    payload: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Writes `contents` to `path` via a sibling temp file and an atomic
/// rename, so a crashed write can never leave a partial file at the final
/// path.
fn write_atomically(path: &Path, contents: &str) -> Result<(), ArtifactError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ModelArtifact {
    pub fn new(labels: Vec<String>, pipeline: TrainedPipeline) -> Self {
        Self {
            labels,
            vectorizer: pipeline.vectorizer,
            classifier: pipeline.classifier,
        }
    }

    /// Serializes the artifact into its checksummed envelope at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let payload = serde_json::to_string(self)?;
        let envelope = ArtifactEnvelope {
            format_version: ARTIFACT_FORMAT_VERSION,
            checksum: sha256_hex(payload.as_bytes()),
            payload,
        };
        let contents = serde_json::to_string(&envelope)?;
        write_atomically(path.as_ref(), &contents)?;
        info!("Saved model artifact to {}", path.as_ref().display());
        Ok(())
    }

    /// Loads and verifies an artifact written by [`ModelArtifact::save`].
    ///
    /// Rejects envelopes with a foreign format version and payloads whose
    /// checksum no longer matches.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let envelope: ArtifactEnvelope = serde_json::from_str(&contents)?;
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::VersionMismatch {
                expected: ARTIFACT_FORMAT_VERSION,
                found: envelope.format_version,
            });
        }
        let actual = sha256_hex(envelope.payload.as_bytes());
        if actual != envelope.checksum {
            return Err(ArtifactError::ChecksumMismatch {
                expected: envelope.checksum,
                actual,
            });
        }
        let artifact = serde_json::from_str(&envelope.payload)?;
        Ok(artifact)
    }
}

/// Path management for datasets and model artifacts.
///
/// Folders default to `./dataset` and `./model`, overridable with the
/// `STOCKTAG_DATASET_DIR` and `STOCKTAG_MODEL_DIR` environment variables.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dataset_dir: PathBuf,
    model_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(dataset_dir: P, model_dir: Q) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn new_default() -> Self {
        let dataset_dir = env::var("STOCKTAG_DATASET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATASET_DIR));
        let model_dir = env::var("STOCKTAG_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_DIR));
        Self::new(dataset_dir, model_dir)
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dataset_dir)?;
        fs::create_dir_all(&self.model_dir)?;
        Ok(())
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.dataset_dir.join(name)
    }

    pub fn train_table_path(&self) -> PathBuf {
        self.dataset_dir.join("train.csv")
    }

    pub fn test_table_path(&self) -> PathBuf {
        self.dataset_dir.join("test.csv")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join("labels.json")
    }

    /// Artifact file for one training run, named after the split seed.
    pub fn classifier_path(&self, seed: u64) -> PathBuf {
        self.model_dir.join(format!("classifier_{}", seed))
    }

    /// Persists the artifact bundle and exports its label vocabulary as
    /// `labels.json` for external consumers. The bundle stays authoritative
    /// at load time.
    pub fn save_artifact(
        &self,
        artifact: &ModelArtifact,
        seed: u64,
    ) -> Result<PathBuf, ArtifactError> {
        fs::create_dir_all(&self.model_dir)?;
        let path = self.classifier_path(seed);
        artifact.save(&path)?;
        let labels_json = serde_json::to_string_pretty(&artifact.labels)?;
        write_atomically(&self.labels_path(), &labels_json)?;
        Ok(path)
    }

    pub fn load_artifact(&self, seed: u64) -> Result<ModelArtifact, ArtifactError> {
        ModelArtifact::load(self.classifier_path(seed))
    }
}
