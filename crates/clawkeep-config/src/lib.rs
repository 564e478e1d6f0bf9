pub mod catalog;
pub mod loader;
pub mod model;
pub mod patch;

pub use catalog::{ModelCatalogEntry, build as build_catalog};
pub use loader::{ConfigSnapshot, ConfigStore, default_path, load, locate};
pub use model::{AgentDefaults, GatewaySettings, ModelEntry, OpenClawConfig, ProviderConfig};
