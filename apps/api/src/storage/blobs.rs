//! Blob Store — a single flat directory of uploaded résumé files.
//!
//! Files are named `<millisecond-timestamp>-<original-filename>`. Writes use
//! `create_new`, so an existing blob is never overwritten.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Bound on name-collision retries within one `put`.
const MAX_NAME_ATTEMPTS: i64 = 16;

#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// `<root>/<file_name>`, the value persisted as `resumePath`.
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BlobStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the blob directory if it is missing.
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!("Blob directory ready at {}", self.root.display());
        Ok(())
    }

    /// Writes `contents` under a fresh timestamped name derived from `original_name`.
    pub async fn put(&self, original_name: &str, contents: &[u8]) -> io::Result<StoredBlob> {
        let original = sanitize_file_name(original_name);
        let started_at = Utc::now().timestamp_millis();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let file_name = blob_file_name(started_at + offset, &original);
            let path = self.root.join(&file_name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Blob name {file_name} taken, advancing timestamp");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Err(e) = write_all(&mut file, contents).await {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!(
                        "Could not remove partially written blob {}: {cleanup}",
                        path.display()
                    );
                }
                return Err(e);
            }

            return Ok(StoredBlob { path, file_name });
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free blob name for '{original}' after {MAX_NAME_ATTEMPTS} attempts"),
        ))
    }

    /// Deletes a blob. Used to undo a write whose record insert failed.
    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }
}

async fn write_all(file: &mut fs::File, contents: &[u8]) -> io::Result<()> {
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Resolves a stored `resumePath` against the working directory.
pub fn resolve(stored_path: &str) -> io::Result<PathBuf> {
    std::path::absolute(stored_path)
}

fn blob_file_name(timestamp_ms: i64, original: &str) -> String {
    format!("{timestamp_ms}-{original}")
}

/// Keeps only the final path component of a client-supplied filename.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => "resume".to_string(),
        other => other.to_string(),
    }
}
