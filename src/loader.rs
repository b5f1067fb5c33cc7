use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::fs::{DirectoryChange, EntryKind, Filesystem, WatchHandle};
use crate::settings::Location;

/// Outcome of walking a profile's configured locations.
///
/// The loader itself never fails: every filesystem problem is scoped to the
/// entry that caused it. A load only counts as failed when the resulting
/// pool is empty, and that judgement belongs to the engine.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Deduplicated candidate URIs, in discovery order.
    pub pool: Vec<String>,
    /// Active watches for every enumerated directory.
    pub watches: Vec<WatchHandle>,
    /// Number of configured locations that were attempted.
    pub locations: usize,
}

/// Walk `locations`, collecting wallpaper candidates whose content type
/// passes `allow` and registering a change watch per enumerated directory.
pub fn load_locations(
    fs: &dyn Filesystem,
    locations: &[Location],
    allow: &dyn Fn(&str) -> bool,
    watch_tx: &UnboundedSender<DirectoryChange>,
) -> LoadReport {
    let mut report = LoadReport {
        locations: locations.len(),
        ..LoadReport::default()
    };
    let mut seen = HashSet::new();

    for location in locations {
        debug!(
            uri = %location.uri,
            recursive = location.recursive,
            "loading location"
        );
        load_entry(
            fs,
            &location.uri,
            location.recursive,
            true,
            allow,
            watch_tx,
            &mut seen,
            &mut report,
        );
    }

    report
}

#[allow(clippy::too_many_arguments)]
fn load_entry(
    fs: &dyn Filesystem,
    uri: &str,
    recursive: bool,
    top_level: bool,
    allow: &dyn Fn(&str) -> bool,
    watch_tx: &UnboundedSender<DirectoryChange>,
    seen: &mut HashSet<String>,
    report: &mut LoadReport,
) {
    let info = match fs.stat(uri) {
        Ok(info) => info,
        Err(err) => {
            warn!(uri, error = %err, "cannot stat location, skipping");
            return;
        }
    };

    match info.kind {
        // A non-recursive top-level directory still has its immediate
        // children visited once; only recursive directories are descended
        // past that.
        EntryKind::Directory if recursive || top_level => {
            match fs.watch(uri, watch_tx) {
                Ok(handle) => report.watches.push(handle),
                Err(err) => warn!(uri, error = %err, "cannot watch directory"),
            }
            let children = match fs.children(uri) {
                Ok(children) => children,
                Err(err) => {
                    warn!(uri, error = %err, "cannot enumerate directory, skipping");
                    return;
                }
            };
            for child in children {
                load_entry(fs, &child, recursive, false, allow, watch_tx, seen, report);
            }
        }
        EntryKind::Directory => {
            debug!(uri, "skipping subdirectory of non-recursive location");
        }
        EntryKind::File => match info.content_type {
            Some(content_type) if allow(&content_type) => {
                if seen.insert(uri.to_string()) {
                    debug!(uri, content_type, "adding wallpaper");
                    report.pool.push(uri.to_string());
                } else {
                    debug!(uri, "already in pool, skipping duplicate");
                }
            }
            Some(content_type) => {
                debug!(uri, content_type, "content type not allowed, skipping");
            }
            None => {
                debug!(uri, "unknown content type, skipping");
            }
        },
        EntryKind::Other => {
            debug!(uri, "not a file or directory, skipping");
        }
    }
}
