// settings shared by every command that talks to a model

use clap::{Args, ValueEnum};
use std::fmt;

/// Which model backend generates sql. Picked once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Claude,
    #[value(name = "openai")]
    OpenAi,
    #[value(alias = "vertexai")]
    Gemini,
    Ollama,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Args, Clone, Debug)]
pub struct AiConfig {
    /// ai provider (claude, openai, gemini/vertexai, ollama)
    #[arg(long, short = 'p', env = "LLM_PROVIDER", default_value = "claude", global = true)]
    pub provider: Provider,

    /// api key for the ai provider (falls back to the provider's usual env var)
    #[arg(long, short = 'k', env = "LLM_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// model name, provider default if omitted
    #[arg(long, env = "LLM_MODEL", global = true)]
    pub model: Option<String>,

    /// override the provider's api base url
    #[arg(long, env = "LLM_BASE_URL", global = true)]
    pub base_url: Option<String>,
}

impl AiConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            api_key: None,
            model: None,
            base_url: None,
        }
    }
}
