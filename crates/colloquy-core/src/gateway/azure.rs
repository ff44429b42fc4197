//! Azure OpenAI chat-completions gateway
//!
//! Speaks the function-calling wire contract of Azure OpenAI deployments:
//! `POST {endpoint}/openai/deployments/{deployment}/chat/completions` with an
//! `api-key` header and an `api-version` query parameter. Everything
//! provider-specific (envelope shapes, status classification, arguments as
//! JSON strings) stays inside this module; callers only see
//! [`GatewayReply`](super::GatewayReply).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Message, MessageRole, ToolCallRequest, ToolDeclaration};

use super::error::{GatewayError, GatewayResult};
use super::traits::{GatewayReply, LlmGateway};

const PROVIDER: &str = "azure-openai";

/// Connection settings for one Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    /// API version query parameter
    pub api_version: String,
    /// Deployment name inside the resource
    pub deployment: String,
    /// Sampling temperature
    pub temperature: f32,
    /// HTTP client timeout
    pub timeout: Duration,
}

impl AzureConfig {
    /// Create a config with the default temperature and timeout
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            deployment: deployment.into(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the HTTP client timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gateway implementation backed by an Azure OpenAI deployment
#[derive(Debug)]
pub struct AzureOpenAiGateway {
    config: AzureConfig,
    client: reqwest::Client,
}

impl AzureOpenAiGateway {
    /// Create a gateway from connection settings
    pub fn new(config: AzureConfig) -> GatewayResult<Self> {
        if config.api_key.is_empty() {
            return Err(GatewayError::missing_api_key(PROVIDER));
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment
        )
    }
}

#[async_trait]
impl LlmGateway for AzureOpenAiGateway {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip_all, fields(deployment = %self.config.deployment))]
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolDeclaration],
    ) -> GatewayResult<GatewayReply> {
        let request = build_request(history, tools, self.config.temperature)?;

        let response = self
            .client
            .post(self.completions_url())
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body.trim()));
        }

        let wire: WireResponse = response.json().await?;
        parse_reply(wire)
    }
}

fn map_send_error(error: reqwest::Error, timeout: Duration) -> GatewayError {
    if error.is_timeout() {
        GatewayError::timeout(timeout)
    } else {
        GatewayError::Http(error)
    }
}

/// Map a non-success HTTP status to the error taxonomy
fn classify_status(status: u16, body: &str) -> GatewayError {
    match status {
        401 | 403 => GatewayError::auth(PROVIDER, status),
        429 => GatewayError::rate_limited(PROVIDER, body),
        408 | 500..=599 => GatewayError::upstream(PROVIDER, status, body),
        _ => GatewayError::invalid_request(PROVIDER, status, body),
    }
}

// ── wire shapes ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct WireRequest {
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// The provider carries arguments as a JSON-encoded string
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn build_request(
    history: &[Message],
    tools: &[ToolDeclaration],
    temperature: f32,
) -> GatewayResult<WireRequest> {
    let messages = history
        .iter()
        .map(to_wire_message)
        .collect::<GatewayResult<Vec<_>>>()?;
    let (tools, tool_choice) = if tools.is_empty() {
        (None, None)
    } else {
        (
            Some(tools.iter().map(to_wire_tool).collect()),
            Some("auto"),
        )
    };
    Ok(WireRequest {
        messages,
        tools,
        tool_choice,
        temperature,
    })
}

fn to_wire_message(message: &Message) -> GatewayResult<WireMessage> {
    let mut wire = WireMessage {
        role: message.role.to_string(),
        content: Some(message.content.clone()),
        tool_calls: None,
        tool_call_id: None,
    };

    if message.announces_tool_calls() {
        // an announcement may have no text at all
        if message.content.is_empty() {
            wire.content = None;
        }
        wire.tool_calls = Some(
            message
                .tool_calls
                .iter()
                .map(|call| {
                    Ok(WireToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: serde_json::to_string(&call.arguments)?,
                        },
                    })
                })
                .collect::<GatewayResult<Vec<_>>>()?,
        );
    }

    if message.role == MessageRole::Tool {
        wire.tool_call_id = message.tool_call_id.clone();
    }

    Ok(wire)
}

fn to_wire_tool(declaration: &ToolDeclaration) -> WireTool {
    WireTool {
        kind: "function",
        function: WireFunction {
            name: declaration.name.clone(),
            description: declaration.description.clone(),
            parameters: declaration.schema.to_json_schema(),
        },
    }
}

fn parse_reply(response: WireResponse) -> GatewayResult<GatewayReply> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "response contained no choices"))?;

    if let Some(finish_reason) = &choice.finish_reason {
        tracing::debug!(%finish_reason, "model call finished");
    }

    match choice.message.tool_calls {
        Some(calls) if !calls.is_empty() => {
            let requests = calls
                .into_iter()
                .map(|call| {
                    let arguments: Value =
                        serde_json::from_str(&call.function.arguments).map_err(|e| {
                            GatewayError::invalid_response(
                                PROVIDER,
                                format!(
                                    "tool call `{}` carried unparseable arguments: {e}",
                                    call.function.name
                                ),
                            )
                        })?;
                    Ok(ToolCallRequest::new(call.id, call.function.name, arguments))
                })
                .collect::<GatewayResult<Vec<_>>>()?;
            Ok(GatewayReply::ToolCalls(requests))
        }
        _ => Ok(GatewayReply::Text(
            choice.message.content.unwrap_or_default(),
        )),
    }
}
