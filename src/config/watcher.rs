//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a new file and renaming it over the old one still
//! trigger a reload. A single save often fires several events; a config
//! identical to the last one published is not sent again.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Publishes every valid change of one config file.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    fn watch_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Start watching. Updates stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self.watch_dir();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let path = self.path.clone();
        let tx = self.update_tx;
        let last_sent: Mutex<Option<GatewayConfig>> = Mutex::new(None);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = ?e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if !ours {
                    return;
                }

                match load_config(&path) {
                    Ok(config) => {
                        let mut last = last_sent.lock().unwrap_or_else(|e| e.into_inner());
                        if last.as_ref() == Some(&config) {
                            return;
                        }
                        tracing::info!(path = ?path, "Config file changed, applying");
                        *last = Some(config.clone());
                        let _ = tx.send(config);
                    }
                    // Half-written files land here too; the next event retries.
                    Err(e) => tracing::warn!(
                        path = ?path,
                        error = %e,
                        "Ignoring config change, keeping current configuration"
                    ),
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_change_is_published_once_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        fs::write(&path, "").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        fs::write(&path, "[upstream]\norigin = \"http://127.0.0.1:6001\"\n").unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("no config update")
            .unwrap();
        assert_eq!(config.upstream.origin, "http://127.0.0.1:6001");
    }

    #[test]
    fn test_bare_file_name_watches_current_dir() {
        let (watcher, _) = ConfigWatcher::new(Path::new("gateway.toml"));
        assert_eq!(watcher.watch_dir(), PathBuf::from("."));
    }
}
