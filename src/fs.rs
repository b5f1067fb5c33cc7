use std::io;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;

/// Change notification raised by a directory watch.
///
/// Carries only the watched location; the engine decides what (if anything)
/// to do about it.
#[derive(Debug, Clone)]
pub struct DirectoryChange {
    pub uri: String,
}

/// What a URI resolves to on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub kind: EntryKind,
    /// MIME type for regular files, when one can be determined.
    pub content_type: Option<String>,
}

/// Cancellable handle for one watched directory. Dropping the handle
/// cancels the watch before the drop returns, so no stale callback can
/// fire against cleared profile state.
pub struct WatchHandle {
    uri: String,
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    pub(crate) fn new(uri: String, watcher: RecommendedWatcher) -> Self {
        Self {
            uri,
            _watcher: watcher,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "cancelling directory watch");
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").field("uri", &self.uri).finish()
    }
}

/// Filesystem collaborator. The engine and loader only ever see URIs; this
/// trait owns the mapping to actual filesystem entries.
pub trait Filesystem {
    /// Resolve `uri` to an entry, reporting its kind and content type.
    fn stat(&self, uri: &str) -> io::Result<EntryInfo>;

    /// Enumerate the immediate children of a directory as URIs.
    fn children(&self, uri: &str) -> io::Result<Vec<String>>;

    /// Watch a directory for changes, delivering notifications through
    /// `tx`. The caller keeps the returned handle alive for as long as the
    /// watch should exist.
    fn watch(
        &self,
        uri: &str,
        tx: &UnboundedSender<DirectoryChange>,
    ) -> Result<WatchHandle, Error>;
}

/// Provider over the local filesystem using `file://` URIs. Bare paths are
/// accepted and treated as local paths.
#[derive(Debug, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for LocalFilesystem {
    fn stat(&self, uri: &str) -> io::Result<EntryInfo> {
        let path = uri_to_path(uri);
        let meta = std::fs::metadata(&path)?;
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        let content_type = match kind {
            EntryKind::File => content_type_for(&path),
            _ => None,
        };
        Ok(EntryInfo { kind, content_type })
    }

    fn children(&self, uri: &str) -> io::Result<Vec<String>> {
        let path = uri_to_path(uri);
        let mut out = Vec::new();
        for entry in WalkDir::new(&path)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
        {
            match entry {
                Ok(entry) => out.push(path_to_uri(entry.path())),
                // An unreadable root is a real failure; unreadable
                // children are skipped like any other bad entry.
                Err(err) if err.depth() == 0 => {
                    return Err(err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("walkdir error")));
                }
                Err(err) => warn!(uri, error = %err, "skipping unreadable directory entry"),
            }
        }
        // Stable enumeration order keeps loads deterministic.
        out.sort();
        Ok(out)
    }

    fn watch(
        &self,
        uri: &str,
        tx: &UnboundedSender<DirectoryChange>,
    ) -> Result<WatchHandle, Error> {
        let path = uri_to_path(uri);
        let watched = uri.to_string();
        let tx = tx.clone();
        // Bridge notify's callback thread onto the engine's event pump via
        // the channel; the callback never touches engine state itself.
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    debug!(kind = ?event.kind, uri = %watched, "directory change");
                    let _ = tx.send(DirectoryChange {
                        uri: watched.clone(),
                    });
                }
                Err(err) => warn!(uri = %watched, error = %err, "watch error"),
            }
        })?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        debug!(uri, "registered directory watch");
        Ok(WatchHandle::new(uri.to_string(), watcher))
    }
}

/// Map a `file://` URI to a local path. Anything without the scheme is
/// taken as a plain path.
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// Map a local path back to a `file://` URI.
pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Content type inferred from the file extension. Only the image types the
/// rotation understands are mapped; everything else is unknown.
fn content_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime.to_string())
}
