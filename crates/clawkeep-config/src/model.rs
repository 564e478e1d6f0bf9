//! Typed view of `openclaw.json`.
//!
//! Only `models`, `agents` and `gateway` are required. Everything else is
//! optional, and every struct keeps the keys it does not recognise in a
//! flattened `extra` map. This view is read-only: edits go through
//! [`crate::patch`] on the raw document so nothing here is ever written back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Root of the gateway configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenClawConfig {
    pub models: ModelsSection,
    pub agents: AgentsSection,
    pub gateway: GatewaySettings,

    #[serde(default, deserialize_with = "lenient")]
    pub meta: Option<Meta>,
    #[serde(default, deserialize_with = "lenient")]
    pub wizard: Option<Wizard>,
    #[serde(default, deserialize_with = "lenient")]
    pub auth: Option<AuthSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub tools: Option<Tools>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages: Option<Messages>,
    #[serde(default, deserialize_with = "lenient")]
    pub commands: Option<Commands>,
    #[serde(default, deserialize_with = "lenient")]
    pub hooks: Option<Hooks>,
    #[serde(default, deserialize_with = "lenient")]
    pub channels: Option<Channels>,
    #[serde(default, deserialize_with = "lenient")]
    pub plugins: Option<Plugins>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OpenClawConfig {
    /// The model currently selected as primary.
    pub fn primary_model(&self) -> &str {
        &self.agents.defaults.model.primary
    }

    pub fn fallback_models(&self) -> &[String] {
        &self.agents.defaults.model.fallbacks
    }
}

/// Decode an optional section, reading a malformed one as absent.
///
/// Only the core sections may fail a load. The raw document keeps the
/// original value, so nothing is lost when a patch rewrites the file.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(section) => Ok(Some(section)),
        Err(e) => {
            debug!("ignoring malformed optional section: {e}");
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Core sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsSection {
    #[serde(default)]
    pub mode: Option<String>,

    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api: Option<String>,

    #[serde(default)]
    pub models: Vec<ModelEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderConfig {
    /// Model ids that appear more than once in this provider's list.
    pub fn duplicate_model_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for model in &self.models {
            if !seen.insert(model.id.as_str()) && !dupes.contains(&model.id.as_str()) {
                dupes.push(model.id.as_str());
            }
        }
        dupes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reasoning: Option<bool>,
    #[serde(default)]
    pub input: Option<Vec<String>>,
    #[serde(default)]
    pub cost: Option<ModelCost>,
    #[serde(default)]
    pub context_window: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelEntry {
    /// Declared name, or the id when the entry has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Per-token pricing, in whatever unit the provider declares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCost {
    #[serde(default)]
    pub input: Option<f64>,
    #[serde(default)]
    pub output: Option<f64>,
    #[serde(default)]
    pub cache_read: Option<f64>,
    #[serde(default)]
    pub cache_write: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsSection {
    pub defaults: AgentDefaults,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    pub model: ModelSelection,

    /// Alias declarations keyed by `"<provider>/<modelId>"`.
    #[serde(default)]
    pub models: Option<BTreeMap<String, ModelAlias>>,

    #[serde(default)]
    pub workspace: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Primary model plus fallbacks in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub primary: String,
    pub fallbacks: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelAlias {
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    pub port: u16,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub auth: Option<GatewayAuth>,
    #[serde(default, deserialize_with = "lenient")]
    pub tailscale: Option<Tailscale>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayAuth {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tailscale {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub reset_on_exit: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Pass-through sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub last_touched_version: Option<String>,
    #[serde(default)]
    pub last_touched_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wizard {
    #[serde(default)]
    pub last_run_at: Option<String>,
    #[serde(default)]
    pub last_run_version: Option<String>,
    #[serde(default)]
    pub last_run_command: Option<String>,
    #[serde(default)]
    pub last_run_mode: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, deserialize_with = "lenient")]
    pub profiles: Option<BTreeMap<String, AuthProfile>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthProfile {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tools {
    #[serde(default, deserialize_with = "lenient")]
    pub web: Option<WebTools>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebTools {
    #[serde(default, deserialize_with = "lenient")]
    pub search: Option<WebSearch>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearch {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    #[serde(default)]
    pub ack_reaction_scope: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commands {
    #[serde(default)]
    pub native: Option<Value>,
    #[serde(default)]
    pub native_skills: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default, deserialize_with = "lenient")]
    pub internal: Option<InternalHooks>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InternalHooks {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub entries: Option<BTreeMap<String, Toggle>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An `{ "enabled": bool }` entry, used by hooks and plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Toggle {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channels {
    #[serde(default, deserialize_with = "lenient")]
    pub telegram: Option<TelegramChannel>,
    #[serde(default, deserialize_with = "lenient")]
    pub discord: Option<DiscordChannel>,
    #[serde(default, deserialize_with = "lenient")]
    pub slack: Option<SlackChannel>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessagePolicy {
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub allow_from: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannel {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dm_policy: Option<String>,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub allow_from: Option<Vec<Value>>,
    #[serde(default)]
    pub group_policy: Option<String>,
    #[serde(default)]
    pub stream_mode: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordChannel {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub group_policy: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dm: Option<DirectMessagePolicy>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackChannel {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub app_token: Option<String>,
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dm: Option<DirectMessagePolicy>,
    #[serde(default)]
    pub dm_policy: Option<String>,
    #[serde(default)]
    pub group_policy: Option<String>,
    #[serde(default)]
    pub user_token_read_only: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plugins {
    #[serde(default, deserialize_with = "lenient")]
    pub entries: Option<BTreeMap<String, Toggle>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
