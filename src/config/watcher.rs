//! Hot reload of the relay configuration file.
//!
//! The directory holding the file is watched rather than the file itself:
//! editors that save by writing a temporary file and renaming it over the
//! original replace the inode, which a watch on the file would lose.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RelayConfig;

/// Sends a freshly loaded [`RelayConfig`] every time the file on disk
/// changes and still parses and validates.
pub struct ConfigWatcher {
    file: PathBuf,
    updates: mpsc::UnboundedSender<RelayConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RelayConfig>) {
        let (updates, update_rx) = mpsc::unbounded_channel();
        let file = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        (Self { file, updates }, update_rx)
    }

    /// Start watching. Reloads stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = self.file;
        let updates = self.updates;
        let watched = file.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if concerns(&event, &watched) => reload(&watched, &updates),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %file.display(), "Watching config file for changes");
        Ok(watcher)
    }
}

/// Whether a directory event touched the config file with a content change.
fn concerns(event: &Event, file: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let name = file.file_name();
    event
        .paths
        .iter()
        .any(|p| p == file || (name.is_some() && p.file_name() == name))
}

fn reload(file: &Path, updates: &mpsc::UnboundedSender<RelayConfig>) {
    match load_config(file) {
        Ok(config) => {
            tracing::info!(path = %file.display(), "Config file changed, applying");
            let _ = updates.send(config);
        }
        // Mid-write saves land here too; the next event retries.
        Err(e) => tracing::warn!(
            path = %file.display(),
            error = %e,
            "Config reload rejected, keeping current configuration"
        ),
    }
}
