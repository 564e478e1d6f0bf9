//! Stop-and-relaunch of the gateway process.
//!
//! This is best effort. Exit codes are logged, never acted on, and the caller
//! finds out whether the gateway came back by probing it again.

use std::process::Stdio;
use std::time::Duration;

use clawkeep_common::{Error, Result};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_PROCESS_PATTERN: &str = "openclaw gateway";
pub const DEFAULT_LAUNCH_COMMAND: &str = "openclaw gateway";
/// Pause between stopping the old process and starting the new one.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
/// How long callers usually wait before re-probing after a restart.
pub const RESTART_RECHECK_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RestartCommand {
    /// Full-command-line pattern handed to `pkill -f`.
    pub pattern: String,
    /// Shell command that starts the gateway in the background.
    pub launch: String,
    pub settle: Duration,
}

impl Default for RestartCommand {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PROCESS_PATTERN.to_string(),
            launch: DEFAULT_LAUNCH_COMMAND.to_string(),
            settle: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl RestartCommand {
    /// Kill processes matching the pattern, wait, then start the gateway
    /// detached with its output discarded.
    ///
    /// Only a failure to spawn the launch command is an error. A missing
    /// `pkill`, or nothing to kill, is logged and ignored.
    pub async fn run(&self) -> Result<()> {
        // pkill runs directly, not through a shell: a shell whose command line
        // contains the pattern would match and kill itself.
        match Command::new("pkill")
            .arg("-f")
            .arg(&self.pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => info!("stopped processes matching '{}'", self.pattern),
            Ok(status) => debug!("pkill -f '{}' exited with {status}", self.pattern),
            Err(e) => warn!("could not run pkill: {e}"),
        }

        tokio::time::sleep(self.settle).await;

        let child = Command::new("sh")
            .arg("-c")
            .arg(format!("exec {}", self.launch))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Process(format!("failed to launch '{}': {e}", self.launch)))?;

        info!(
            "launched '{}' (pid {})",
            self.launch,
            child.id().map_or_else(|| "?".to_string(), |id| id.to_string())
        );
        Ok(())
    }

    /// Fire-and-forget form of [`run`](Self::run).
    pub fn spawn(&self) -> JoinHandle<()> {
        let cmd = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cmd.run().await {
                warn!("gateway restart failed: {e}");
            }
        })
    }
}
