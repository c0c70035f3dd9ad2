//! File entry walker
//!
//! Lazily walks the site root and describes every regular file found.
//! Order is by file name at each directory level so classification, and
//! with it bucket insertion order, is deterministic.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use tokio::fs;
use walkdir::WalkDir;

use crate::error::{BuildError, BuildPhase};

/// Prefix of the scratch directories created by client builds
pub(crate) const SCRATCH_PREFIX: &str = ".pathway-build-";

/// One walked file, created once per build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub absolute_path: PathBuf,

    /// Path relative to the site root, always `/`-separated
    pub relative_path: String,

    pub filename: String,

    /// Last extension including its dot (`.css`), empty when there is none
    pub extension: String,

    pub mime_type: Option<String>,
}

impl FileDescriptor {
    /// Describes `absolute_path` as seen from `root`
    pub fn new(root: &Path, absolute_path: impl Into<PathBuf>) -> Self {
        let absolute_path = absolute_path.into();
        let relative_path = absolute_path
            .strip_prefix(root)
            .unwrap_or(&absolute_path)
            .to_string_lossy()
            .replace('\\', "/");
        let filename = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = absolute_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mime_type = guess_mime(&extension).map(str::to_string);

        Self {
            absolute_path,
            relative_path,
            filename,
            extension,
            mime_type,
        }
    }

    /// Whether the file name ends with any of `extensions`
    ///
    /// Compares whole suffixes, so multi-part extensions like `.d.ts` work.
    pub fn has_extension<S: AsRef<str>>(&self, extensions: &[S]) -> bool {
        extensions
            .iter()
            .map(|ext| ext.as_ref())
            .any(|ext| !ext.is_empty() && self.filename.ends_with(ext) && self.filename != ext)
    }

    /// File name up to its first dot (`_root` for `_root.tsx`)
    pub fn stem(&self) -> &str {
        self.filename.split('.').next().unwrap_or_default()
    }

    /// Opens the file as an async byte stream
    pub async fn open(&self) -> std::io::Result<fs::File> {
        fs::File::open(&self.absolute_path).await
    }

    /// Reads the whole file
    pub async fn read_bytes(&self) -> Result<Bytes, BuildError> {
        fs::read(&self.absolute_path)
            .await
            .map(Bytes::from)
            .map_err(|e| BuildError::fs(BuildPhase::Static, &self.absolute_path, e))
    }
}

/// Lazily yields every regular file under `root`
///
/// Symlinks are followed; directories are descended into but never yielded.
/// Scratch directories left by client builds are skipped.
pub fn walk_files(root: &Path) -> impl Iterator<Item = Result<FileDescriptor, BuildError>> {
    let root_buf = root.to_path_buf();

    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(SCRATCH_PREFIX))
        })
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                Some(Ok(FileDescriptor::new(&root_buf, entry.into_path())))
            }
            Ok(_) => None,
            Err(source) => Some(Err(BuildError::Walk {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root_buf.clone()),
                source,
            })),
        })
}

/// MIME type for a file extension (with or without its leading dot)
pub fn guess_mime(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" | "cjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ts" | "tsx" | "jsx" => "text/javascript; charset=utf-8",
        _ => return None,
    };
    Some(mime)
}
