//! Text-generation providers

pub mod gemini;
pub mod openai;
pub mod traits;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use traits::{GenerationSettings, ProviderError, ProviderResult, TextGenerator};

use crate::config::{Config, KeyFile, ProviderConfig};
use std::sync::Arc;

fn settings_for(pc: &ProviderConfig) -> GenerationSettings {
    let settings = GenerationSettings::new(&pc.default_model).with_max_output_tokens(pc.max_output_tokens);
    match pc.temperature {
        Some(t) => settings.with_temperature(t),
        None => settings,
    }
}

/// Build the generator registered under `name`, applying its config section.
///
/// API keys are resolved from the config, then the environment, then the
/// legacy key file.
pub fn create_generator(
    name: &str,
    config: &Config,
    key_file: Option<&KeyFile>,
) -> ProviderResult<Arc<dyn TextGenerator>> {
    let pc = config
        .get_provider(name)
        .ok_or_else(|| ProviderError::Config(format!("No configuration for provider: {}", name)))?;

    if !pc.enabled {
        return Err(ProviderError::Config(format!("Provider {} is disabled", name)));
    }

    let api_key = pc
        .resolve_api_key(key_file)
        .ok_or_else(|| ProviderError::Config(format!("No API key for provider {} (set {})", name, pc.api_key_env)))?;

    let generator: Arc<dyn TextGenerator> = match pc.name.to_lowercase().as_str() {
        "gemini" | "google" => {
            let mut client = GeminiClient::new(api_key).with_settings(settings_for(pc));
            if let Some(url) = &pc.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        "openai" | "gpt" => {
            let mut client = OpenAIClient::new(api_key).with_settings(settings_for(pc));
            if let Some(url) = &pc.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        other => return Err(ProviderError::Config(format!("Unknown provider: {}", other))),
    };

    tracing::debug!("Created {} generator with model {}", generator.name(), generator.model());
    Ok(generator)
}
