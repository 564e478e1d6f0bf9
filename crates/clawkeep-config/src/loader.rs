use std::path::{Path, PathBuf};
use std::sync::Arc;

use clawkeep_common::{Error, Result};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::model::OpenClawConfig;
use crate::patch::{self, Document};

pub const CONFIG_FILE_NAME: &str = "openclaw.json";
pub const LEGACY_CONFIG_FILE_NAME: &str = "moltbot.json";

/// Ordered list of places a config file may live.
///
/// The working directory comes first, then `~/.openclaw`, then the old
/// `~/.moltbot` directory under both the current and the legacy file name.
pub fn candidate_paths(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(home) = home {
        paths.push(home.join(".openclaw").join(CONFIG_FILE_NAME));
        paths.push(home.join(".moltbot").join(CONFIG_FILE_NAME));
        paths.push(home.join(".moltbot").join(LEGACY_CONFIG_FILE_NAME));
    }
    paths
}

/// Find the first existing config file from the process's cwd and home.
pub fn locate() -> Result<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    locate_in(&cwd, dirs::home_dir().as_deref())
}

pub fn locate_in(cwd: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let candidates = candidate_paths(cwd, home);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }
    let checked = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::NotFound(format!("checked {checked}")))
}

/// Where a new install keeps its config: `~/.openclaw/openclaw.json`.
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openclaw")
        .join(CONFIG_FILE_NAME)
}

/// Read and decode the config at `path`.
pub fn load(path: &Path) -> Result<OpenClawConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Read(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents).map_err(|e| Error::Decode(format!("{}: {e}", path.display())))
}

/// What observers see: the last good config plus the latest load error.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub config: Option<Arc<OpenClawConfig>>,
    pub error: Option<String>,
}

/// Owns the config path and the last successfully decoded config.
///
/// A failed load never replaces a good config; it only records the error.
/// Patching takes `&mut self`, so edits made through one store are serialised.
pub struct ConfigStore {
    path: PathBuf,
    tx: watch::Sender<ConfigSnapshot>,
}

impl ConfigStore {
    /// Create a store for `path` and try to load it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let (tx, _) = watch::channel(ConfigSnapshot::default());
        let mut store = Self {
            path: path.into(),
            tx,
        };
        let _ = store.reload();
        store
    }

    /// Open the located config, or the default path when none exists yet.
    pub fn discover() -> Self {
        let path = match locate() {
            Ok(path) => path,
            Err(e) => {
                info!("{e}; falling back to {}", default_path().display());
                default_path()
            }
        };
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last successfully loaded config, if any.
    pub fn config(&self) -> Option<Arc<OpenClawConfig>> {
        self.tx.borrow().config.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.tx.borrow().error.clone()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        self.tx.borrow().clone()
    }

    /// Receive a new snapshot after every load attempt.
    pub fn subscribe(&self) -> watch::Receiver<ConfigSnapshot> {
        self.tx.subscribe()
    }

    /// Re-read the current path.
    pub fn reload(&mut self) -> Result<Arc<OpenClawConfig>> {
        let path = self.path.clone();
        self.load_from(&path)
    }

    /// Load `path` and adopt it as the store's path on success.
    ///
    /// On failure both the path and the previous config are kept.
    pub fn load_from(&mut self, path: &Path) -> Result<Arc<OpenClawConfig>> {
        match load(path) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                let config = Arc::new(config);
                self.path = path.to_path_buf();
                self.tx.send_modify(|snap| {
                    snap.config = Some(Arc::clone(&config));
                    snap.error = None;
                });
                Ok(config)
            }
            Err(e) => {
                let kept = if self.config().is_some() {
                    "keeping last good config"
                } else {
                    "no config loaded"
                };
                warn!("{e} ({kept})");
                let message = e.to_string();
                self.tx.send_modify(|snap| snap.error = Some(message));
                Err(e)
            }
        }
    }

    /// Point the store at another file, e.g. one the user picked by hand.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> Result<Arc<OpenClawConfig>> {
        let path = path.into();
        self.load_from(&path)
    }

    /// The on-disk document as plain JSON, including sections the typed
    /// view does not model.
    pub fn raw_document(&self) -> Result<Document> {
        patch::read_document(&self.path)
    }

    /// Patch the file on disk, then reload the typed view.
    ///
    /// A patch error (or an error returned by `mutation`) leaves both the file
    /// and the in-memory config as they were. If the write succeeds but the
    /// result no longer decodes, the error is returned and the previous config
    /// is retained.
    pub fn apply_patch<T, F>(&mut self, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let out = match patch::apply_patch(&self.path, mutation) {
            Ok(out) => out,
            Err(e) => {
                warn!("patch of {} failed: {e}", self.path.display());
                let message = e.to_string();
                self.tx.send_modify(|snap| snap.error = Some(message));
                return Err(e);
            }
        };
        self.reload()?;
        Ok(out)
    }

    pub fn set_primary_model(&mut self, model: &str) -> Result<()> {
        self.apply_patch(|doc| {
            patch::set_primary_model(doc, model);
            Ok(())
        })
    }

    pub fn set_fallback_models(&mut self, models: &[String]) -> Result<()> {
        self.apply_patch(|doc| {
            patch::set_fallback_models(doc, models);
            Ok(())
        })
    }

    pub fn add_fallback_model(&mut self, model: &str) -> Result<()> {
        self.apply_patch(|doc| {
            patch::add_fallback_model(doc, model);
            Ok(())
        })
    }

    /// Remove the fallback at `index` (0-based) and return it.
    pub fn remove_fallback_model(&mut self, index: usize) -> Result<Value> {
        self.apply_patch(|doc| patch::remove_fallback_model(doc, index))
    }

    pub fn replace_fallback_model(&mut self, index: usize, model: &str) -> Result<Value> {
        self.apply_patch(|doc| patch::replace_fallback_model(doc, index, model))
    }
}
