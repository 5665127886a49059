//! Writing and removing object bytes on the private root.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncRead;

use crate::traits::{StorageError, StorageResult};

/// Sibling temp file, unique per write so concurrent writers never share one.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.part", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Stream `reader` into `path`. Readers never observe a half-written object:
/// bytes land in a sibling `.part` file that is renamed once synced. With
/// concurrent writers the last rename wins and each result is whole.
pub async fn write_blob<R>(path: &Path, mut reader: R) -> StorageResult<u64>
where
    R: AsyncRead + Send + Unpin,
{
    let start = std::time::Instant::now();
    let partial = part_path(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial)
        .await
        .map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                partial.display(),
                e
            ))
        })?;

    let copied = tokio::io::copy(&mut reader, &mut file).await;
    let bytes_copied = match copied {
        Ok(n) => n,
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                partial.display(),
                e
            )));
        }
    };

    file.sync_all().await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to sync file {}: {}", partial.display(), e))
    })?;
    drop(file);

    fs::rename(&partial, path).await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to move upload into place {}: {}", path.display(), e))
    })?;

    tracing::info!(
        path = %path.display(),
        size_bytes = bytes_copied,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Object bytes stored"
    );

    Ok(bytes_copied)
}

pub async fn blob_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Remove object bytes. A missing file is not an error.
pub async fn delete_blob(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Object bytes deleted");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::DeleteFailed(format!(
            "Failed to delete file {}: {}",
            path.display(),
            e
        ))),
    }
}
