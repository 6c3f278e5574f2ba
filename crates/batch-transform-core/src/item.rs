use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Media kinds the transform service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Png => "png",
            MediaKind::Jpeg => "jpeg",
            MediaKind::Webp => "webp",
            MediaKind::Avif => "avif",
        }
    }

    /// Classify a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MediaKind::Png),
            "jpg" | "jpeg" => Some(MediaKind::Jpeg),
            "webp" => Some(MediaKind::Webp),
            "avif" => Some(MediaKind::Avif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type declared to the transform service
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Png => "image/png",
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Webp => "image/webp",
            MediaKind::Avif => "image/avif",
        }
    }
}

/// One file submitted to the engine.
///
/// `key` is the path relative to the root the item was discovered under,
/// always `/`-separated. It is the item's stable identifier across passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    /// Absolute (or root-joined) path of the source file
    pub source: PathBuf,

    /// Root-relative identifier
    pub key: String,

    /// Declared media kind
    pub kind: MediaKind,

    /// Source size in bytes at discovery time
    pub size: u64,
}

impl WorkItem {
    /// Build an item for `path` discovered under `root`.
    ///
    /// Reads the file's metadata for its size; fails for unsupported kinds.
    pub fn from_path(root: &Path, path: &Path) -> Result<Self> {
        let kind = MediaKind::from_path(path)
            .ok_or_else(|| CoreError::UnsupportedKind(path.to_path_buf()))?;
        let key = relative_key(root, path)?;
        let size = std::fs::metadata(path)?.len();

        Ok(WorkItem {
            source: path.to_path_buf(),
            key,
            kind,
            size,
        })
    }

    /// Base name of the source file
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Root-relative path of the item, rebuilt with platform separators
    pub fn relative_path(&self) -> PathBuf {
        self.key.split('/').collect()
    }
}

fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| CoreError::NotUnderRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(CoreError::NotUnderRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        });
    }

    Ok(parts.join("/"))
}
