use std::path::{Component, Path, PathBuf};

use photovault_core::constants::UPLOADS_DIR;
use photovault_core::{LogicalPath, ObjectId, StorageConfig};
use tokio::fs;

use crate::traits::{StorageError, StorageResult};

/// Which configured tree a location lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRoot {
    Private,
    /// Index into the ordered public search roots.
    Public { index: usize },
}

/// A physical location split into its root designation and relative suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub root: StorageRoot,
    pub relative: PathBuf,
    pub physical: PathBuf,
}

/// Maps logical object paths onto the private root and the public search roots.
///
/// Resolution is deterministic for a given configuration and filesystem state.
/// The private root is only demanded when an operation needs it, so a service
/// can boot without one and still serve public objects.
#[derive(Clone, Debug)]
pub struct PathResolver {
    private_root: Option<PathBuf>,
    public_roots: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(private_root: Option<PathBuf>, public_roots: Vec<PathBuf>) -> Self {
        Self {
            private_root,
            public_roots,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.private_object_dir.clone(),
            config.public_object_search_paths.clone(),
        )
    }

    /// The configured private root, or a configuration error.
    pub fn private_root(&self) -> StorageResult<&Path> {
        self.private_root.as_deref().ok_or_else(|| {
            StorageError::Configuration(
                "PRIVATE_OBJECT_DIR not set. Set it to a local directory path.".to_string(),
            )
        })
    }

    pub fn public_roots(&self) -> &[PathBuf] {
        &self.public_roots
    }

    /// Private location addressed by an object id. Does not touch the filesystem.
    pub fn location_for(&self, object_id: &ObjectId) -> StorageResult<StorageLocation> {
        let relative = Path::new(UPLOADS_DIR).join(object_id.as_str());
        Ok(StorageLocation {
            root: StorageRoot::Private,
            physical: self.private_root()?.join(&relative),
            relative,
        })
    }

    /// Mint a fresh object id and prepare its writable path under the private root.
    ///
    /// Creating an already existing directory is a no-op, so concurrent calls
    /// never race each other into an error.
    pub async fn resolve_upload_target(&self) -> StorageResult<(ObjectId, PathBuf)> {
        let object_id = ObjectId::generate();
        let location = self.location_for(&object_id)?;

        if let Some(parent) = location.physical.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create upload directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tracing::debug!(
            object_id = %object_id,
            path = %location.physical.display(),
            "Resolved upload target"
        );

        Ok((object_id, location.physical))
    }

    /// Resolve a logical path to an existing file under the private root.
    pub async fn resolve_for_read(&self, logical: &LogicalPath) -> StorageResult<StorageLocation> {
        let root = self.private_root()?;
        let relative = validate_relative(logical.relative())?;
        let physical = root.join(&relative);

        match fs::metadata(&physical).await {
            Ok(meta) if meta.is_file() => {}
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(StorageError::IoError(e))
            }
            // Includes paths that pass through a regular file
            _ => return Err(StorageError::NotFound(logical.to_string())),
        }

        ensure_within(root, &physical).await?;

        Ok(StorageLocation {
            root: StorageRoot::Private,
            relative,
            physical,
        })
    }

    /// Search the public roots in declaration order. First match wins,
    /// which lets earlier roots override later ones.
    pub async fn resolve_public(&self, relative: &str) -> Option<StorageLocation> {
        let relative = validate_relative(relative).ok()?;

        for (index, root) in self.public_roots.iter().enumerate() {
            let physical = root.join(&relative);
            let is_file = fs::metadata(&physical)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file || ensure_within(root, &physical).await.is_err() {
                continue;
            }

            tracing::debug!(
                root_index = index,
                path = %physical.display(),
                "Resolved public object"
            );
            return Some(StorageLocation {
                root: StorageRoot::Public { index },
                relative,
                physical,
            });
        }

        None
    }

    /// Turn a physical path under the private root into its logical path.
    pub fn to_logical_path(&self, physical: &Path) -> StorageResult<LogicalPath> {
        let root = self.private_root()?;
        let relative = physical.strip_prefix(root).map_err(|_| {
            StorageError::InvalidKey("Path is outside the private object root".to_string())
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment.to_str().ok_or_else(|| {
                        StorageError::InvalidKey("Path segment is not valid UTF-8".to_string())
                    })?;
                    segments.push(segment.to_string());
                }
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::InvalidKey(
                        "Path contains invalid components".to_string(),
                    ))
                }
            }
        }
        if segments.is_empty() {
            return Err(StorageError::InvalidKey(
                "Path does not name an object".to_string(),
            ));
        }

        Ok(LogicalPath::from_relative(&segments.join("/")))
    }
}

/// Reject anything that could escape the root it is joined onto.
fn validate_relative(relative: &str) -> StorageResult<PathBuf> {
    if relative.contains('\\') || relative.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    let mut clean = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => clean.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidKey(
                    "Storage key contains invalid characters".to_string(),
                ))
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    Ok(clean)
}

/// Symlinks may still point elsewhere; compare canonical forms.
async fn ensure_within(root: &Path, physical: &Path) -> StorageResult<()> {
    let root_canonical = fs::canonicalize(root).await.map_err(|e| {
        StorageError::Configuration(format!("Failed to canonicalize root: {}", e))
    })?;
    let canonical = fs::canonicalize(physical).await?;
    if canonical.strip_prefix(&root_canonical).is_err() {
        return Err(StorageError::InvalidKey(
            "Storage key resolves outside storage directory".to_string(),
        ));
    }
    Ok(())
}
