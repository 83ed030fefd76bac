pub mod generator;
mod http;
pub mod message;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use generator::{StageGenerators, TextGenerator};
pub use message::{Message, MessageRole};
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;
pub use scripted::ScriptedGenerator;

use crate::config::{Backend, ErmConfig, GeneratorConfig, GeneratorRole};
use crate::error::Result;
use std::sync::Arc;

/// construct the backend a resolved config names
pub fn build_generator(config: GeneratorConfig) -> Result<Arc<dyn TextGenerator>> {
    tracing::info!(
        backend = config.backend.as_str(),
        model = %config.model,
        "creating generator"
    );

    let generator: Arc<dyn TextGenerator> = match config.backend {
        Backend::Ollama => Arc::new(OllamaGenerator::new(config)?),
        Backend::OpenAi => Arc::new(OpenAiGenerator::new(config)?),
        Backend::Scripted => Arc::new(ScriptedGenerator::with_replies(config.script)),
    };

    Ok(generator)
}

/// one generator per role, built once at startup and handed to the pipeline
pub fn build_stage_generators(config: &ErmConfig) -> Result<StageGenerators> {
    let build = |role: GeneratorRole| {
        tracing::debug!(role = role.as_str(), "resolving generator");
        build_generator(config.resolve(role))
    };

    Ok(StageGenerators {
        analysis: build(GeneratorRole::Analysis)?,
        table: build(GeneratorRole::Table)?,
        sql: build(GeneratorRole::Sql)?,
        tutor: build(GeneratorRole::Tutor)?,
    })
}
