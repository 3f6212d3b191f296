//! File-system store for uploaded lab result files.
//!
//! Blobs are named `<uuid>[.<ext>]` inside a single directory. The database
//! keeps the name (`file_ref`) and the SHA-256 of the content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Blob store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Stored file missing: {0}")]
    Missing(String),

    #[error("Invalid file reference: {0}")]
    InvalidRef(String),

    #[error("Stored file {0} does not match its recorded digest")]
    DigestMismatch(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A blob that has been written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub file_ref: String,
    pub size_bytes: i64,
    pub sha256: String,
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Lowercased extension of an uploaded filename, if it is short and alphanumeric.
fn safe_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 16 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[derive(Debug, Clone)]
pub struct LabResultStore {
    root: PathBuf,
}

impl LabResultStore {
    /// Open the store, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_ref: &str) -> StorageResult<PathBuf> {
        let valid = !file_ref.is_empty()
            && file_ref
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !file_ref.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidRef(file_ref.to_string()));
        }
        Ok(self.root.join(file_ref))
    }

    /// Write a new blob. A partially written file is removed on failure.
    pub fn store(&self, original_filename: &str, bytes: &[u8]) -> StorageResult<StoredBlob> {
        let file_ref = match safe_extension(original_filename) {
            Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let path = self.path_for(&file_ref)?;

        if let Err(source) = fs::write(&path, bytes) {
            let _ = fs::remove_file(&path);
            return Err(StorageError::Io { path, source });
        }

        Ok(StoredBlob {
            file_ref,
            size_bytes: bytes.len() as i64,
            sha256: sha256_hex(bytes),
        })
    }

    /// Read a blob and check it against the recorded digest.
    pub fn read(&self, file_ref: &str, expected_sha256: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(file_ref)?;
        let bytes = fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StorageError::Missing(file_ref.to_string()),
            _ => StorageError::Io {
                path: path.clone(),
                source,
            },
        })?;
        if sha256_hex(&bytes) != expected_sha256 {
            return Err(StorageError::DigestMismatch(file_ref.to_string()));
        }
        Ok(bytes)
    }

    /// Delete a blob. Deleting a missing blob is not an error.
    pub fn remove(&self, file_ref: &str) -> StorageResult<()> {
        let path = self.path_for(file_ref)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    pub fn exists(&self, file_ref: &str) -> bool {
        self.path_for(file_ref).map(|p| p.is_file()).unwrap_or(false)
    }
}
