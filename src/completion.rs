//! Language-model completion.
//!
//! The rewrite stage only needs text in, text out. [`Completer`] is that
//! seam; [`ChatClient`] implements it against an OpenAI-compatible chat
//! completions endpoint (Groq by default).

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RewriteConfig;
use crate::error::{SqlcellError, SqlcellResult};

/// Text-in, text-out completion.
pub trait Completer {
    fn complete(&self, prompt: &str) -> impl Future<Output = SqlcellResult<String>> + Send;
}

/// Build the prompt asking the model to fully qualify table references.
pub fn rewrite_prompt(sql: &str, catalog: &str, schema: &str) -> String {
    format!(
        r#"
You are given SQL code that was transpiled using LakeBridge.

Task:
- Modify all table references to use the full three-level namespace format: catalog.schema.table
- If the table is referred to as just "table" or "schema.table", expand it to "catalog.schema.table"
- Use the following defaults where not specified:
  - catalog: {catalog}
  - schema: {schema}
- Do not explain anything or return extra text. Only return the modified SQL script.

Here is the SQL code:
{sql}
"#
    )
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatClient {
    /// Build a client from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &RewriteConfig) -> SqlcellResult<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SqlcellError::Config(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(config, api_key))
    }

    pub fn new(config: &RewriteConfig, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
            top_p: config.top_p,
        }
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
            top_p: self.top_p,
            stream: false,
        }
    }
}

impl Completer for ChatClient {
    async fn complete(&self, prompt: &str) -> SqlcellResult<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SqlcellError::Completion(format!("{}: {}", status, body)));
        }

        let body: ChatResponse = response.json().await?;
        Ok(first_content(body))
    }
}

/// Content of the first choice; empty when the model returned none.
fn first_content(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default()
}
