pub mod activity;
pub mod probe;
pub mod status;
pub mod supervisor;

pub use activity::{Activity, ActivityMonitor, ActivitySettings};
pub use probe::{Liveness, ProbeHandle, ProbeTarget, probe};
pub use status::{GatewayStatus, StatusMonitor};
pub use supervisor::RestartCommand;
