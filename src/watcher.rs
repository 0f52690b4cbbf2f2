//! Preset file watch
//!
//! Hand edits to `items.json` while the app runs trigger a wholesale reload
//! through the configuration service. There is no merge: the file on disk
//! replaces whatever the service holds in memory.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::service::ConfigHandle;

/// Keeps the OS watch alive; dropping it stops watching
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True if `event` touches the preset file in a way that can change its content
fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Watch `path` and post a reload to `handle` on every change
///
/// The parent directory is watched rather than the file so editors that save
/// by replacing the file are still seen.
pub fn watch(path: &Path, handle: ConfigHandle) -> Result<ConfigWatcher> {
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .context(format!("Preset path {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .context(format!("Failed to create preset directory: {}", dir.display()))?;

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, &file_name) => {
            debug!(kind = ?event.kind, "Preset file changed on disk");
            if let Err(e) = handle.reload() {
                error!(error = %e, "Failed to queue preset reload");
            }
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "File watch error"),
    })
    .context("Failed to create file watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .context(format!("Failed to watch {}", dir.display()))?;

    info!(path = %path.display(), "Watching preset file for changes");
    Ok(ConfigWatcher {
        _watcher: watcher,
        path: path.to_path_buf(),
    })
}
