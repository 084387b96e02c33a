//! Built-in backend presets.
//!
//! Every preset speaks the OpenAI chat-completions protocol. A preset names
//! the endpoint, the model used for generation, a cheaper model used for the
//! validation verdict, and the environment variable holding the API key.

use anyhow::{Context, Result};

use super::openai::{ChatEndpoint, OpenAiCompatibleGenerator};
use super::registry::GeneratorRegistry;

/// A known backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPreset {
    pub name: &'static str,
    pub base_url: &'static str,
    pub chat_model: &'static str,
    pub validation_model: &'static str,
    pub api_key_env: &'static str,
}

const PRESETS: &[BackendPreset] = &[
    BackendPreset {
        name: "openai",
        base_url: "https://api.openai.com",
        chat_model: "gpt-4.1",
        validation_model: "gpt-4.1-mini",
        api_key_env: "OPENAI_API_KEY",
    },
    BackendPreset {
        name: "deepseek",
        base_url: "https://api.deepseek.com",
        chat_model: "deepseek-chat",
        validation_model: "deepseek-chat",
        api_key_env: "DEEPSEEK_API_KEY",
    },
    BackendPreset {
        name: "grok",
        base_url: "https://api.x.ai",
        chat_model: "grok-3",
        validation_model: "grok-3-mini",
        api_key_env: "XAI_API_KEY",
    },
];

/// Look up a preset by name.
pub fn preset(name: &str) -> Option<BackendPreset> {
    PRESETS.iter().copied().find(|p| p.name == name)
}

/// Names of every built-in preset.
pub fn available() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

impl BackendPreset {
    /// Build a generator for this preset with the given API key.
    pub fn into_generator(self, api_key: impl Into<String>) -> OpenAiCompatibleGenerator {
        OpenAiCompatibleGenerator::new(
            self.name,
            ChatEndpoint {
                base_url: self.base_url.to_string(),
                chat_model: self.chat_model.to_string(),
                validation_model: self.validation_model.to_string(),
                api_key: api_key.into(),
            },
        )
    }
}

/// Build a registry from preset names, in the given order.
///
/// `lookup_key` resolves an environment variable name to its value (pass
/// `|k| std::env::var(k).ok()` in production). Unknown preset names and
/// missing API keys are errors: both are startup misconfigurations.
pub fn build_registry<F>(names: &[String], lookup_key: F) -> Result<GeneratorRegistry>
where
    F: Fn(&str) -> Option<String>,
{
    let mut registry = GeneratorRegistry::new();
    for name in names {
        let preset = preset(name).with_context(|| {
            format!(
                "unknown backend {name:?} (available: {})",
                available().join(", ")
            )
        })?;
        let api_key = lookup_key(preset.api_key_env)
            .filter(|k| !k.is_empty())
            .with_context(|| {
                format!(
                    "backend {name:?} requires the {} environment variable",
                    preset.api_key_env
                )
            })?;
        registry.register(preset.into_generator(api_key));
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn known_presets_resolve() {
        for name in available() {
            assert_eq!(preset(name).unwrap().name, name);
        }
        assert!(preset("llama").is_none());
    }

    #[test]
    fn build_registry_keeps_order() {
        let registry =
            build_registry(&names(&["grok", "openai"]), |_| Some("key".to_string())).unwrap();
        assert_eq!(registry.list(), vec!["grok", "openai"]);
    }

    #[test]
    fn build_registry_rejects_unknown_preset() {
        let err = build_registry(&names(&["nope"]), |_| Some("key".to_string())).unwrap_err();
        assert!(err.to_string().contains("unknown backend"));
    }

    #[test]
    fn build_registry_requires_api_key() {
        let err = build_registry(&names(&["deepseek"]), |_| None).unwrap_err();
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));

        let err = build_registry(&names(&["openai"]), |_| Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
