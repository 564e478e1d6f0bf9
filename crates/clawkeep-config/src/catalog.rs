//! Display-ready list of the models a user can pick from.
//!
//! Models come from two places in the config: the per-provider model lists
//! under `models.providers`, and the alias map under `agents.defaults.models`.
//! Both are merged into one list keyed by `"<provider>/<modelId>"`.

use clawkeep_common::ModelRef;
use serde::Serialize;
use std::collections::HashSet;

use crate::model::OpenClawConfig;

/// Provider that runs models on this machine.
pub const LOCAL_PROVIDER: &str = "ollama";

const PROVIDER_LABELS: &[(&str, &str)] = &[
    ("anthropic", "Anthropic"),
    ("google-gemini-cli", "Google Gemini"),
    ("openai", "OpenAI"),
    ("openrouter", "OpenRouter"),
    ("groq", "Groq"),
    ("zai", "Z.ai"),
    ("ollama", "Ollama"),
];

// Keys are lowercase.
const MODEL_LABELS: &[(&str, &str)] = &[
    ("gemini-3-pro-preview", "Gemini 3.0 Pro"),
    ("gemini-3-flash", "Gemini 3.0 Flash"),
    ("claude-opus-4-5", "Claude Opus 4.5"),
    ("claude-sonnet-4-5", "Claude Sonnet 4.5"),
    ("claude-sonnet-4-7", "Claude Sonnet 4.7"),
    ("gpt-4o-mini", "GPT-4o Mini"),
    ("llama-3.3-70b-versatile", "Llama 3.3 70B"),
    ("qwen2.5-coder:14b", "Qwen 2.5 Coder 14B"),
    ("qwen2.5:7b", "Qwen 2.5 7B"),
    ("glm-4.7", "GLM-4.7"),
];

const SHORT_ALIASES: &[(&str, &str)] = &[
    ("anthropic/claude-opus-4-5", "Opus"),
    ("anthropic/claude-sonnet-4-5", "Sonnet"),
    ("google-gemini-cli/gemini-3-pro-preview", "Flash"),
];

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalogEntry {
    /// `"<provider>/<modelId>"`, or the alias key for alias-derived entries.
    pub id: String,
    pub display_name: String,
    /// Human label of the provider.
    pub provider: String,
    pub is_local: bool,
    pub is_known: bool,
}

/// Human label for a provider name, if it is one we know.
pub fn provider_label(provider: &str) -> Option<&'static str> {
    PROVIDER_LABELS
        .iter()
        .find(|(key, _)| *key == provider)
        .map(|(_, label)| *label)
}

/// Human label for a bare model id, matched case-insensitively.
pub fn model_label(model_id: &str) -> Option<&'static str> {
    let lowered = model_id.to_lowercase();
    MODEL_LABELS
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, label)| *label)
}

/// One-word name for the handful of models people switch between most.
pub fn short_alias(reference: &str) -> Option<&'static str> {
    SHORT_ALIASES
        .iter()
        .find(|(key, _)| *key == reference)
        .map(|(_, label)| *label)
}

/// Display name for any model reference, qualified or bare.
///
/// Unknown ids come back unchanged, minus the provider prefix.
pub fn model_display_name(reference: &str) -> String {
    let model_id = ModelRef::new(reference).model_id().to_string();
    model_label(&model_id).map_or(model_id, str::to_string)
}

/// Build the merged, deduplicated catalog sorted by display name.
///
/// Provider lists are read before aliases, so a provider entry wins when both
/// declare the same id. Providers are visited in name order, which keeps the
/// output stable for entries whose display names tie.
pub fn build(config: &OpenClawConfig) -> Vec<ModelCatalogEntry> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (provider_name, provider) in &config.models.providers {
        let provider_display = provider_label(provider_name).unwrap_or(provider_name.as_str());
        let is_local = provider_name == LOCAL_PROVIDER;

        for model in &provider.models {
            let id = ModelRef::qualified(provider_name, &model.id).into_string();
            if !seen.insert(id.clone()) {
                continue;
            }
            entries.push(ModelCatalogEntry {
                id,
                display_name: model.display_name().to_string(),
                provider: provider_display.to_string(),
                is_local,
                is_known: !is_local,
            });
        }
    }

    if let Some(aliases) = &config.agents.defaults.models {
        for alias_key in aliases.keys() {
            let reference = ModelRef::new(alias_key.as_str());
            let Some((provider_name, model_id)) = reference.split() else {
                continue;
            };
            if seen.contains(alias_key) {
                continue;
            }
            seen.insert(alias_key.clone());
            entries.push(ModelCatalogEntry {
                id: alias_key.clone(),
                display_name: model_label(model_id).unwrap_or(model_id).to_string(),
                provider: provider_label(provider_name)
                    .unwrap_or(provider_name)
                    .to_string(),
                is_local: false,
                is_known: true,
            });
        }
    }

    entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    entries
}
