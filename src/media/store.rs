//! Filesystem blob store
//!
//! Supplies the two primitives streaming needs: object length lookup and a
//! sequential reader positioned at a byte offset.

use serde::Serialize;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};

use super::catalog::MediaEntry;
use crate::error::{MediaError, Result};
use crate::http::ByteRange;
use crate::logger;

/// Length and type of a stored object, fixed for the duration of one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaObject {
    pub id: String,
    pub total_length: u64,
    pub content_type: String,
}

/// Look up the current length of an entry's file under `root`
pub async fn stat(root: &Path, entry: &MediaEntry) -> Result<MediaObject> {
    let path = locate(root, entry).await?;
    let metadata = match fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(file_missing(entry)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(file_missing(entry)),
        Err(e) => return Err(e.into()),
    };

    Ok(MediaObject {
        id: entry.id.clone(),
        total_length: metadata.len(),
        content_type: entry.content_type.clone(),
    })
}

/// Open a reader yielding exactly the bytes of `range` (fewer if the file shrank)
pub async fn open_range(root: &Path, entry: &MediaEntry, range: ByteRange) -> Result<Take<File>> {
    let mut file = open(root, entry).await?;
    file.seek(SeekFrom::Start(range.start)).await?;
    Ok(file.take(range.len()))
}

/// Open a reader over the first `total_length` bytes
pub async fn open_full(root: &Path, entry: &MediaEntry, total_length: u64) -> Result<Take<File>> {
    Ok(open(root, entry).await?.take(total_length))
}

async fn open(root: &Path, entry: &MediaEntry) -> Result<File> {
    let path = locate(root, entry).await?;
    File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            file_missing(entry)
        } else {
            e.into()
        }
    })
}

/// Resolve symlinks and make sure the file still lives under `root`
///
/// The file may have been swapped since the catalog was built, so this runs on
/// every access.
async fn locate(root: &Path, entry: &MediaEntry) -> Result<PathBuf> {
    let resolved = match fs::canonicalize(&entry.path).await {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(file_missing(entry)),
        Err(e) => return Err(e.into()),
    };

    if !resolved.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: media '{}' -> {}",
            entry.id,
            resolved.display()
        ));
        return Err(file_missing(entry));
    }
    Ok(resolved)
}

fn file_missing(entry: &MediaEntry) -> MediaError {
    MediaError::FileMissing {
        id: entry.id.clone(),
        path: entry.path.clone(),
    }
}
