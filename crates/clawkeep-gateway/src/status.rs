use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::activity::{Activity, ActivityMonitor};
use crate::probe::{Liveness, ProbeTarget};

/// Combined gateway state as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    #[default]
    Stopped,
    Idle,
    Active,
}

impl GatewayStatus {
    pub fn from_parts(liveness: Liveness, activity: Activity) -> Self {
        match (liveness, activity) {
            (Liveness::Unreachable, _) => GatewayStatus::Stopped,
            (Liveness::Reachable, Activity::Idle) => GatewayStatus::Idle,
            (Liveness::Reachable, Activity::Active) => GatewayStatus::Active,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GatewayStatus::Stopped => "Stopped",
            GatewayStatus::Idle => "Idle",
            GatewayStatus::Active => "Active",
        }
    }

    pub fn is_running(self) -> bool {
        self != GatewayStatus::Stopped
    }
}

/// Probes the gateway and checks its logs, publishing every status change.
pub struct StatusMonitor {
    target: ProbeTarget,
    activity: ActivityMonitor,
    tx: watch::Sender<GatewayStatus>,
}

impl StatusMonitor {
    pub fn new(target: ProbeTarget, activity: ActivityMonitor) -> Self {
        let (tx, _) = watch::channel(GatewayStatus::Stopped);
        Self {
            target,
            activity,
            tx,
        }
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    /// Follow a new gateway port, e.g. after the config was edited.
    pub fn set_target(&mut self, target: ProbeTarget) {
        self.target = target;
    }

    pub fn activity(&self) -> &ActivityMonitor {
        &self.activity
    }

    pub fn current(&self) -> GatewayStatus {
        *self.tx.borrow()
    }

    /// Receivers are woken only when the status actually changes.
    pub fn subscribe(&self) -> watch::Receiver<GatewayStatus> {
        self.tx.subscribe()
    }

    /// Probe once, tick the activity monitor, and publish the result.
    pub async fn refresh(&mut self) -> GatewayStatus {
        let liveness = self.target.probe().await;
        let activity = self.activity.tick(liveness, SystemTime::now());
        let status = GatewayStatus::from_parts(liveness, activity);

        self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            info!("gateway status: {} -> {}", current.label(), status.label());
            *current = status;
            true
        });
        status
    }

    /// Refresh on a fixed interval until the returned task is aborted.
    ///
    /// Subscribe before calling this; the monitor moves into the task.
    pub fn spawn(mut self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_parts() {
        assert_eq!(
            GatewayStatus::from_parts(Liveness::Unreachable, Activity::Active),
            GatewayStatus::Stopped
        );
        assert_eq!(
            GatewayStatus::from_parts(Liveness::Reachable, Activity::Idle),
            GatewayStatus::Idle
        );
        assert_eq!(
            GatewayStatus::from_parts(Liveness::Reachable, Activity::Active),
            GatewayStatus::Active
        );
    }

    #[test]
    fn labels() {
        assert_eq!(GatewayStatus::Stopped.label(), "Stopped");
        assert!(!GatewayStatus::Stopped.is_running());
        assert!(GatewayStatus::Idle.is_running());
    }
}
