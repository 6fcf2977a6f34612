//! Chat-completion backends.
//!
//! The [`ChatBackend`] trait decouples the agent loop from the HTTP provider.
//! Tests use scripted backends that replay canned replies without any network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::io::config::LlmSettings;
use crate::tools::ToolDefinition;

/// LiteLLM routing prefix that OpenRouter itself does not understand.
const OPENROUTER_PREFIX: &str = "openrouter/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON object text, as produced by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Set on [`Role::Tool`] messages.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(output.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// One completion round trip.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub api_key: &'a str,
    pub messages: &'a [ChatMessage],
    /// Empty when the model must answer in plain text.
    pub tools: &'a [ToolDefinition],
}

/// Assistant turn returned by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

/// Abstraction over chat-completion providers.
pub trait ChatBackend {
    fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply>;
}

/// Model id as the provider expects it: `openrouter/vendor/model` becomes `vendor/model`.
pub fn api_model_id(model: &str) -> &str {
    model.strip_prefix(OPENROUTER_PREFIX).unwrap_or(model)
}

/// Blocking client for the OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    client: Client,
    endpoint: String,
}

impl ChatCompletionsBackend {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("build HTTP client for chat completions")?;
        Ok(Self {
            client,
            endpoint: completions_url(&settings.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatBackend for ChatCompletionsBackend {
    #[instrument(skip_all, fields(model = request.model, messages = request.messages.len(), tools = request.tools.len()))]
    fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        let body = request_body(request);
        debug!(endpoint = %self.endpoint, "sending chat completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(request.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("send chat completion to {}", self.endpoint))?;

        let status = response.status();
        let text = response.text().context("read chat completion body")?;
        if !status.is_success() {
            let detail = serde_json::from_str::<WireError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(anyhow!(
                "chat completion failed with HTTP {}: {detail}",
                status.as_u16()
            ));
        }
        parse_reply(&text)
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// Normally a JSON string; some providers send the object itself.
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Deserialize)]
struct WireReplyMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Deserialize)]
struct WireErrorDetail {
    message: String,
}

fn function_kind() -> String {
    "function".to_string()
}

fn request_body<'a>(request: &ChatRequest<'a>) -> WireRequest<'a> {
    WireRequest {
        model: api_model_id(request.model),
        messages: request
            .messages
            .iter()
            .map(|message| WireMessage {
                role: message.role,
                content: message.content.as_deref(),
                tool_calls: message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        kind: function_kind(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: Value::String(call.arguments.clone()),
                        },
                    })
                    .collect(),
                tool_call_id: message.tool_call_id.as_deref(),
            })
            .collect(),
        tools: request
            .tools
            .iter()
            .map(|function| WireTool {
                kind: "function",
                function,
            })
            .collect(),
    }
}

fn parse_reply(body: &str) -> Result<ChatReply> {
    let response: WireResponse =
        serde_json::from_str(body).context("parse chat completion response")?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| ToolCall {
            id: if call.id.is_empty() {
                format!("call_{index}")
            } else {
                call.id
            },
            name: call.function.name,
            arguments: match call.function.arguments {
                Value::String(raw) => raw,
                Value::Null => String::new(),
                other => other.to_string(),
            },
        })
        .collect();

    Ok(ChatReply {
        content: choice.message.content,
        tool_calls,
    })
}
