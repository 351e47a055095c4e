// model integration - turns plain english into (hopefully) sql
// whatever comes back is untrusted and goes through the safety gate

use crate::Error;
use crate::config::{AiConfig, Provider};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TEMPERATURE: f32 = 0.1;
const TOP_P: f32 = 0.95;
const MAX_TOKENS: u32 = 2048;

/// Anything that can turn a question plus a schema into raw model text.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error>;
}

/// The configured generator, built once and handed to whoever needs it.
pub struct Ai {
    inner: Box<dyn SqlGenerator>,
}

impl Ai {
    pub fn new(config: &AiConfig) -> Result<Self, Error> {
        let inner: Box<dyn SqlGenerator> = match config.provider {
            Provider::Claude => Box::new(Claude::new(config)?),
            Provider::OpenAi => Box::new(OpenAi::new(config)?),
            Provider::Gemini => Box::new(Gemini::new(config)?),
            Provider::Ollama => Box::new(Ollama::new(config)),
        };

        info!(provider = inner.name(), "ai provider ready");
        Ok(Self { inner })
    }

    pub fn from_generator(generator: impl SqlGenerator + 'static) -> Self {
        Self {
            inner: Box::new(generator),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.inner.name()
    }

    pub async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error> {
        debug!(provider = self.inner.name(), %prompt, "generating sql");
        let raw = self.inner.generate_sql(prompt, schema).await?;
        debug!(provider = self.inner.name(), %raw, "model replied");
        Ok(raw)
    }
}

/// System prompt shared by every provider.
pub fn system_prompt(schema: &str) -> String {
    format!(
        r#"You are a SQL query generator. Given a natural language request, generate a single read-only SQL query.

Database schema:
{schema}

Rules:
- Generate exactly one SELECT statement, never INSERT, UPDATE, DELETE, DROP, EXEC or SELECT INTO
- Output ONLY the SQL query, no explanations, no markdown, no code fences
- Do not write comments (no -- and no /* */)
- Use the syntax of the database dialect named in the schema
- Be precise with table and column names from the schema
- Limit large results to at most 100 rows
- Make sure the query is complete, never truncate it"#
    )
}

fn api_key(config: &AiConfig, provider: &'static str, vars: &[&str]) -> Result<String, Error> {
    // explicit key wins, then the usual env var names for this provider
    config
        .api_key
        .clone()
        .or_else(|| vars.iter().find_map(|var| std::env::var(var).ok()))
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::MissingApiKey {
            provider,
            vars: format!("LLM_API_KEY, {}", vars.join(", ")),
        })
}

async fn send<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, Error> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await?;
        return Err(Error::Ai {
            provider,
            message: format!("{status}: {body}"),
        });
    }

    Ok(response.json().await?)
}

fn empty_reply(provider: &'static str) -> Error {
    Error::Ai {
        provider,
        message: "model returned no text".to_string(),
    }
}

// anthropic messages api

pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

impl Claude {
    const VARS: &'static [&'static str] = &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "CLAUDE_KEY"];

    pub fn new(config: &AiConfig) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(config, "claude", Self::VARS)?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
        })
    }
}

#[async_trait]
impl SqlGenerator for Claude {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: system_prompt(schema),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: ClaudeResponse = send(
            self.name(),
            self.client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&request),
        )
        .await?;

        let text: String = response.content.into_iter().map(|c| c.text).collect();
        if text.trim().is_empty() {
            return Err(empty_reply(self.name()));
        }
        Ok(text.trim().to_string())
    }
}

// openai chat completions

pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAi {
    const VARS: &'static [&'static str] = &["OPENAI_API_KEY"];

    pub fn new(config: &AiConfig) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(config, "openai", Self::VARS)?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
        })
    }
}

#[async_trait]
impl SqlGenerator for OpenAi {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error> {
        let system = system_prompt(schema);
        let request = OpenAiRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response: OpenAiResponse = send(
            self.name(),
            self.client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| empty_reply(self.name()))
    }
}

// google generative language api (gemini, also served through vertex ai)

pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReply>,
}

#[derive(Deserialize)]
struct GeminiReply {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Deserialize)]
struct GeminiReplyPart {
    #[serde(default)]
    text: String,
}

impl Gemini {
    const VARS: &'static [&'static str] =
        &["GOOGLE_CLOUD_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

    pub fn new(config: &AiConfig) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(config, "gemini", Self::VARS)?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
        })
    }
}

#[async_trait]
impl SqlGenerator for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error> {
        let system = system_prompt(schema);
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: &system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                max_output_tokens: MAX_TOKENS,
            },
        };

        let response: GeminiResponse = send(
            self.name(),
            self.client
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&request),
        )
        .await?;

        // the reply may be split across several parts
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(empty_reply(self.name()));
        }
        Ok(text.trim().to_string())
    }
}

// local ollama, no key needed

pub struct Ollama {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: String,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl Ollama {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "llama3.1:8b".to_string()),
            base_url: config
                .base_url
                .clone()
                .or_else(|| std::env::var("OLLAMA_BASE_URL").ok())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
        }
    }
}

#[async_trait]
impl SqlGenerator for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate_sql(&self, prompt: &str, schema: &str) -> Result<String, Error> {
        let request = OllamaRequest {
            model: &self.model,
            system: system_prompt(schema),
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: MAX_TOKENS,
            },
        };

        let response: OllamaResponse = send(
            self.name(),
            self.client
                .post(format!("{}/api/generate", self.base_url))
                .json(&request),
        )
        .await?;

        if response.response.trim().is_empty() {
            return Err(empty_reply(self.name()));
        }
        Ok(response.response.trim().to_string())
    }
}
