//! generator configuration.
//!
//! a `[generator]` table holds the defaults; `[analysis]`, `[table]`, `[sql]`
//! and `[tutor]` override single keys for one role:
//!
//! ```toml
//! [generator]
//! backend = "ollama"
//! model = "llama3.1"
//!
//! [tutor]
//! backend = "openai"
//! base_url = "https://models.github.ai/inference"
//! model = "openai/gpt-4.1-mini"
//! api_key_env = "GITHUB_TOKEN"
//! ```
//!
//! tokens are never read from the file, only from the variable `api_key_env` names.

use crate::error::{ErmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ermgen.toml";

const DEFAULT_MODEL: &str = "llama3.1";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_URL: &str = "https://models.github.ai/inference";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_P: f32 = 0.95;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Ollama,
    #[serde(rename = "openai", alias = "github")]
    OpenAi,
    Scripted,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Ollama => "ollama",
            Backend::OpenAi => "openai",
            Backend::Scripted => "scripted",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Backend::OpenAi => DEFAULT_OPENAI_URL,
            Backend::Ollama | Backend::Scripted => DEFAULT_OLLAMA_URL,
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ErmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Backend::Ollama),
            "openai" | "github" => Ok(Backend::OpenAi),
            "scripted" => Ok(Backend::Scripted),
            other => Err(ErmError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// which pipeline role a generator serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorRole {
    Analysis,
    Table,
    Sql,
    Tutor,
}

impl GeneratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorRole::Analysis => "analysis",
            GeneratorRole::Table => "table",
            GeneratorRole::Sql => "sql",
            GeneratorRole::Tutor => "tutor",
        }
    }
}

/// one table of the config file; unset keys fall through to `[generator]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub api_key_env: Option<String>,
    pub log_requests: Option<bool>,
    /// canned replies for the scripted backend, served in order
    pub script: Option<Vec<String>>,
}

impl GeneratorSettings {
    /// keys set in `self` win over `base`
    fn overlay(&self, base: &GeneratorSettings) -> GeneratorSettings {
        GeneratorSettings {
            backend: self.backend.or(base.backend),
            model: self.model.clone().or_else(|| base.model.clone()),
            base_url: self.base_url.clone().or_else(|| base.base_url.clone()),
            temperature: self.temperature.or(base.temperature),
            top_p: self.top_p.or(base.top_p),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            api_key_env: self.api_key_env.clone().or_else(|| base.api_key_env.clone()),
            log_requests: self.log_requests.or(base.log_requests),
            script: self.script.clone().or_else(|| base.script.clone()),
        }
    }
}

/// fully resolved settings for one generator
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub backend: Backend,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
    pub api_key_env: Option<String>,
    pub log_requests: bool,
    pub script: Vec<String>,
}

impl GeneratorConfig {
    fn from_settings(settings: GeneratorSettings) -> Self {
        let backend = settings.backend.unwrap_or_default();

        Self {
            backend,
            model: settings.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .unwrap_or_else(|| backend.default_base_url().to_string()),
            temperature: settings.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: settings.top_p.unwrap_or(DEFAULT_TOP_P),
            timeout_secs: settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            api_key_env: settings.api_key_env.filter(|s| !s.is_empty()),
            log_requests: settings.log_requests.unwrap_or(false),
            script: settings.script.unwrap_or_default(),
        }
    }

    /// read the api token from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<Option<String>> {
        let Some(var) = &self.api_key_env else {
            return Ok(None);
        };

        std::env::var(var)
            .ok()
            .filter(|s| !s.is_empty())
            .map(Some)
            .ok_or_else(|| {
                ErmError::Config(format!("api_key_env is '{}' but that variable is not set", var))
            })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_settings(GeneratorSettings::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErmConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub analysis: GeneratorSettings,
    #[serde(default)]
    pub table: GeneratorSettings,
    #[serde(default)]
    pub sql: GeneratorSettings,
    #[serde(default)]
    pub tutor: GeneratorSettings,
}

impl ErmConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ErmError::Config(e.to_string()))
    }

    /// load an explicit path, or `ermgen.toml` from the working directory when
    /// present, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(ErmError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            tracing::debug!("no config file found, using defaults");
            return Ok(Self::default());
        }

        tracing::info!("loading config from {}", path.display());
        let text = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&text)
    }

    /// apply command line overrides to the shared `[generator]` defaults
    pub fn with_overrides(mut self, backend: Option<Backend>, model: Option<String>) -> Self {
        if backend.is_some() {
            self.generator.backend = backend;
        }
        if model.is_some() {
            self.generator.model = model;
        }
        self
    }

    fn role_settings(&self, role: GeneratorRole) -> &GeneratorSettings {
        match role {
            GeneratorRole::Analysis => &self.analysis,
            GeneratorRole::Table => &self.table,
            GeneratorRole::Sql => &self.sql,
            GeneratorRole::Tutor => &self.tutor,
        }
    }

    pub fn resolve(&self, role: GeneratorRole) -> GeneratorConfig {
        GeneratorConfig::from_settings(self.role_settings(role).overlay(&self.generator))
    }
}
