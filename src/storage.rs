//! Filesystem storage area for uploads and export artifacts.
//!
//! Every stored file is addressed by a *storage key*: its path relative to
//! the storage root, always using `/` separators. With upload isolation on,
//! each upload lives in its own `<uuid>/` directory together with the
//! artifacts derived from it.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Public URL prefix under which the storage root is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// URL prefix of the forced-download endpoint.
pub const DOWNLOAD_PREFIX: &str = "/download";

const MAX_FILENAME_BYTES: usize = 200;
const FALLBACK_FILENAME: &str = "upload";
const FALLBACK_IMAGE_EXTENSION: &str = "img";

/// Preferred extension for common image types; `mime_guess` lists several
/// for some of them.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tiff"),
];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("path escapes the storage area: {0}")]
    OutsideRoot(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] io::Error),
}

/// A file inside the storage area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root.
    pub key: String,
    /// Final path component.
    pub filename: String,
    /// Absolute (or root-relative) location on disk.
    pub path: PathBuf,
}

impl StoredFile {
    pub fn public_url(&self) -> String {
        format!("{PUBLIC_PREFIX}/{}", self.key)
    }

    pub fn download_url(&self) -> String {
        format!("{DOWNLOAD_PREFIX}/{}", self.key)
    }
}

/// An uploaded source image.
pub type StoredUpload = StoredFile;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    isolate_uploads: bool,
}

impl Storage {
    /// Open (and create if needed) the storage area at `root`.
    pub async fn open(root: impl Into<PathBuf>, isolate_uploads: bool) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), isolate_uploads, "Storage area ready");
        Ok(Self {
            root,
            isolate_uploads,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload verbatim under its sanitised original name.
    ///
    /// The name always ends in an extension of `mime_type`, so the stored
    /// image never shares a name with an export artifact. Without isolation
    /// an existing file of the same name is overwritten.
    pub async fn save_upload(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload, StorageError> {
        let filename = image_filename(&sanitize_filename(original_name), mime_type);
        let key = if self.isolate_uploads {
            let dir = uuid::Uuid::new_v4().simple().to_string();
            tokio::fs::create_dir_all(self.root.join(&dir)).await?;
            format!("{dir}/{filename}")
        } else {
            filename.clone()
        };

        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(key = %key, size = bytes.len(), "Stored upload");
        Ok(StoredFile {
            key,
            filename,
            path,
        })
    }

    /// Location of the artifact derived from `upload` with `extension`.
    ///
    /// The artifact shares the upload's directory and stem.
    pub fn artifact_for(&self, upload: &StoredUpload, extension: &str) -> StoredFile {
        let filename = Path::new(&upload.filename)
            .with_extension(extension)
            .to_string_lossy()
            .into_owned();
        let key = match upload.key.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{filename}"),
            None => filename.clone(),
        };
        let path = self.root.join(&key);
        StoredFile {
            key,
            filename,
            path,
        }
    }

    /// Resolve a client-supplied key to an existing file inside the root.
    pub async fn resolve(&self, key: &str) -> Result<StoredFile, StorageError> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(StorageError::OutsideRoot(key.to_string()));
        }

        let path = self.root.join(relative);
        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        // Symlinks may still point elsewhere.
        let root = tokio::fs::canonicalize(&self.root).await?;
        if !canonical.starts_with(&root) {
            return Err(StorageError::OutsideRoot(key.to_string()));
        }
        if !tokio::fs::metadata(&canonical).await?.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let filename = canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(StoredFile {
            key: key.to_string(),
            filename,
            path: canonical,
        })
    }

    /// Delete top-level entries last modified more than `max_age` ago.
    ///
    /// Returns how many entries were removed.
    pub async fn sweep(&self, max_age: Duration) -> Result<usize, StorageError> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let modified = metadata.modified()?;
            if modified > cutoff {
                continue;
            }

            let path = entry.path();
            let result = if metadata.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => removed += 1,
                // A concurrent sweep or request may have beaten us to it.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes
/// `_`. Directory parts and leading dots are dropped.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return FALLBACK_FILENAME.to_string();
    }

    if cleaned.len() <= MAX_FILENAME_BYTES {
        return cleaned.to_string();
    }

    // Keep the extension when truncating; the name is pure ASCII here.
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 16 => {
            let keep = MAX_FILENAME_BYTES - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => cleaned[..MAX_FILENAME_BYTES].to_string(),
    }
}

/// Give a sanitised name an extension matching `mime_type`.
///
/// Names whose extension already maps to the type are kept; otherwise the
/// extension is replaced (or added) with the preferred one for the type.
pub fn image_filename(sanitized: &str, mime_type: &str) -> String {
    let matches_type = mime_guess::from_path(sanitized)
        .iter()
        .any(|guess| guess.essence_str().eq_ignore_ascii_case(mime_type));
    if matches_type {
        return sanitized.to_string();
    }

    let extension = IMAGE_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type).and_then(|exts| exts.first().copied())
        })
        .unwrap_or(FALLBACK_IMAGE_EXTENSION);

    let stem = Path::new(sanitized)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_FILENAME);
    let keep = MAX_FILENAME_BYTES - extension.len() - 1;
    format!("{}.{extension}", &stem[..keep.min(stem.len())])
}
