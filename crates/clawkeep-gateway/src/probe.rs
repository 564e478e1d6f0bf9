//! TCP reachability check for the gateway port.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use clawkeep_config::OpenClawConfig;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_PROBE_HOST: &str = "127.0.0.1";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Whether the gateway accepted a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Reachable,
    Unreachable,
}

impl Liveness {
    pub fn is_reachable(self) -> bool {
        self == Liveness::Reachable
    }
}

/// Try one TCP connect to `host:port`, giving up after `timeout`.
///
/// The connection is closed as soon as it is established. Every failure,
/// including name resolution and the timeout itself, is `Unreachable`.
/// Dropping the returned future cancels the attempt and frees the socket.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Liveness {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            debug!("gateway reachable at {host}:{port}");
            Liveness::Reachable
        }
        Ok(Err(e)) => {
            debug!("gateway unreachable at {host}:{port}: {e}");
            Liveness::Unreachable
        }
        Err(_) => {
            debug!("gateway probe to {host}:{port} timed out after {timeout:?}");
            Liveness::Unreachable
        }
    }
}

/// Where and how long to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Loopback probe of the port the config declares.
    pub fn from_config(config: &OpenClawConfig) -> Self {
        Self::new(DEFAULT_PROBE_HOST, config.gateway.port)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn probe(&self) -> Liveness {
        probe(&self.host, self.port, self.timeout).await
    }

    /// Run the probe on the runtime and return immediately.
    pub fn spawn(&self) -> ProbeHandle {
        let target = self.clone();
        ProbeHandle {
            task: tokio::spawn(async move { target.probe().await }),
        }
    }
}

/// An in-flight probe. Awaiting it yields the result; dropping it aborts the
/// probe and closes its socket.
pub struct ProbeHandle {
    task: JoinHandle<Liveness>,
}

impl ProbeHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for ProbeHandle {
    type Output = Liveness;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(liveness)) => Poll::Ready(liveness),
            // Aborted or panicked: no answer, so not reachable.
            Poll::Ready(Err(_)) => Poll::Ready(Liveness::Unreachable),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_defaults_to_loopback_with_one_second_timeout() {
        let config: OpenClawConfig = serde_json::from_str(
            r#"{
                "models": { "providers": {} },
                "agents": { "defaults": { "model": { "primary": "p", "fallbacks": [] } } },
                "gateway": { "port": 18789, "bind": "loopback" }
            }"#,
        )
        .unwrap();
        let target = ProbeTarget::from_config(&config);
        assert_eq!(target.host, "127.0.0.1");
        assert_eq!(target.port, 18789);
        assert_eq!(target.timeout, Duration::from_secs(1));
    }

    #[test]
    fn liveness_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Liveness::Unreachable).unwrap(),
            "\"unreachable\""
        );
    }
}
