use serde::{Deserialize, Serialize};
use std::fmt;

/// A model reference as written in the gateway config, usually
/// `"<provider>/<modelId>"` but bare ids are accepted too.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Build a qualified reference from its two halves.
    pub fn qualified(provider: &str, model_id: &str) -> Self {
        Self(format!("{provider}/{model_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split on the first `/`. Returns `None` for bare ids.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once('/')
    }

    pub fn provider(&self) -> Option<&str> {
        self.split().map(|(provider, _)| provider)
    }

    /// The part after the first `/`, or the whole string for bare ids.
    pub fn model_id(&self) -> &str {
        self.split().map_or(self.0.as_str(), |(_, id)| id)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::ModelRef;

    #[test]
    fn splits_on_first_slash_only() {
        let r = ModelRef::new("openrouter/meta-llama/llama-3-70b");
        assert_eq!(r.provider(), Some("openrouter"));
        assert_eq!(r.model_id(), "meta-llama/llama-3-70b");
    }

    #[test]
    fn bare_id_has_no_provider() {
        let r = ModelRef::new("gpt-4");
        assert_eq!(r.provider(), None);
        assert_eq!(r.model_id(), "gpt-4");
    }

    #[test]
    fn qualified_joins_with_slash() {
        assert_eq!(
            ModelRef::qualified("anthropic", "claude-opus-4-5").as_str(),
            "anthropic/claude-opus-4-5"
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&ModelRef::new("openai/gpt-4o-mini")).unwrap();
        assert_eq!(json, "\"openai/gpt-4o-mini\"");
    }
}
