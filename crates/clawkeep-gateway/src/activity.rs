//! Log-freshness heuristic for "is the gateway doing something right now".
//!
//! The gateway writes `openclaw-<timestamp>.log` files into a temp directory.
//! The file whose name sorts last is taken to be the newest, and the gateway
//! counts as active while that file was written recently. Name order is only a
//! proxy for recency: it holds because the gateway embeds a sortable timestamp
//! in each name, and nothing here checks that.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::debug;

use crate::probe::Liveness;

pub const DEFAULT_LOG_PREFIX: &str = "openclaw-";
pub const DEFAULT_LOG_SUFFIX: &str = ".log";
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone)]
pub struct ActivitySettings {
    pub log_dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// A log written less than this long ago means `Active`.
    pub freshness: Duration,
    pub poll_interval: Duration,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            prefix: DEFAULT_LOG_PREFIX.to_string(),
            suffix: DEFAULT_LOG_SUFFIX.to_string(),
            freshness: DEFAULT_FRESHNESS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// `/tmp/openclaw` on Unix, `<temp>/openclaw` elsewhere.
pub fn default_log_dir() -> PathBuf {
    if cfg!(unix) {
        PathBuf::from("/tmp/openclaw")
    } else {
        std::env::temp_dir().join("openclaw")
    }
}

/// Decide activity from already-gathered facts.
///
/// A modification time in the future counts as fresh.
pub fn classify(
    liveness: Liveness,
    latest_modified: Option<SystemTime>,
    now: SystemTime,
    freshness: Duration,
) -> Activity {
    if !liveness.is_reachable() {
        return Activity::Idle;
    }
    let Some(modified) = latest_modified else {
        return Activity::Idle;
    };
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    if age < freshness {
        Activity::Active
    } else {
        Activity::Idle
    }
}

/// The lexicographically greatest name with the given prefix and suffix.
pub fn select_latest<'a, I>(names: I, prefix: &str, suffix: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
        .max()
}

/// Path of the newest log file in `dir`, if any.
pub fn latest_log_file(dir: &Path, prefix: &str, suffix: &str) -> std::io::Result<Option<PathBuf>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(select_latest(names.iter().map(String::as_str), prefix, suffix).map(|name| dir.join(name)))
}

/// Tracks the latest activity classification between polls.
#[derive(Debug)]
pub struct ActivityMonitor {
    settings: ActivitySettings,
    state: Activity,
    latest_file: Option<PathBuf>,
    latest_modified: Option<SystemTime>,
}

impl ActivityMonitor {
    pub fn new(settings: ActivitySettings) -> Self {
        Self {
            settings,
            state: Activity::Idle,
            latest_file: None,
            latest_modified: None,
        }
    }

    pub fn settings(&self) -> &ActivitySettings {
        &self.settings
    }

    /// Result of the most recent tick.
    pub fn state(&self) -> Activity {
        self.state
    }

    /// The log file the last tick looked at.
    pub fn latest_file(&self) -> Option<&Path> {
        self.latest_file.as_deref()
    }

    pub fn latest_modified(&self) -> Option<SystemTime> {
        self.latest_modified
    }

    /// Re-evaluate activity. Never fails: any filesystem problem is `Idle`.
    ///
    /// The log directory is not touched when the gateway is unreachable.
    pub fn tick(&mut self, liveness: Liveness, now: SystemTime) -> Activity {
        if !liveness.is_reachable() {
            self.latest_file = None;
            self.latest_modified = None;
            self.state = Activity::Idle;
            return self.state;
        }

        let (file, modified) = match self.scan() {
            Ok(found) => found,
            Err(e) => {
                debug!(
                    "cannot read gateway logs in {}: {e}",
                    self.settings.log_dir.display()
                );
                (None, None)
            }
        };

        self.state = classify(liveness, modified, now, self.settings.freshness);
        self.latest_file = file;
        self.latest_modified = modified;
        self.state
    }

    fn scan(&self) -> std::io::Result<(Option<PathBuf>, Option<SystemTime>)> {
        let s = &self.settings;
        let Some(path) = latest_log_file(&s.log_dir, &s.prefix, &s.suffix)? else {
            return Ok((None, None));
        };
        let modified = std::fs::metadata(&path)?.modified()?;
        Ok((Some(path), Some(modified)))
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new(ActivitySettings::default())
    }
}
