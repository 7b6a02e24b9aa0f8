//! Model Artifacts - loading, checksums, metadata
//!
//! Every artifact on disk is fingerprinted with SHA-256 when loaded so the
//! health endpoint can report exactly which file is serving.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::features::LayoutMismatchError;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {} was built for another feature layout: {source}", .path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: LayoutMismatchError,
    },

    #[error("invalid artifact {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("model runtime error: {0}")]
    Runtime(String),
}

/// Metadata for a loaded model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub loaded_at: DateTime<Utc>,
}

impl ModelMetadata {
    pub fn new(path: &Path, model_type: &str, bytes: &[u8]) -> Self {
        Self {
            model_path: path.display().to_string(),
            model_type: model_type.to_string(),
            sha256: sha256_hex(bytes),
            size_bytes: bytes.len() as u64,
            loaded_at: Utc::now(),
        }
    }
}

/// Hex SHA-256 of a byte buffer
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Read a whole artifact file, mapping a missing file to `NotFound`
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and deserialize a JSON artifact, returning it with its metadata
pub fn read_json<T: DeserializeOwned>(
    path: &Path,
    model_type: &str,
) -> Result<(T, ModelMetadata), ArtifactError> {
    let bytes = read_bytes(path)?;
    let value = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, ModelMetadata::new(path, model_type, &bytes)))
}

/// Serialize an artifact as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}
