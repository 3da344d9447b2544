//! OpenAI Chat Completions profile
//!
//! `POST {base}/chat/completions` with bearer auth. The only vendor with a
//! streaming endpoint.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AiMessage, AiModelConfig, AiResponse, ProviderKind, Usage, VendorError, VendorProfile};
use crate::types::{AiError, AiErrorCode, AiResult};

pub(super) static PROFILE: VendorProfile = VendorProfile {
    kind: ProviderKind::OpenAi,
    default_api_base: "https://api.openai.com/v1",
    default_model: "gpt-4o",
    endpoint,
    authorize,
    build_body,
    parse_response,
    parse_error,
    parse_stream_delta: Some(parse_stream_delta),
};

fn endpoint(api_base: &str, _config: &AiModelConfig, _stream: bool) -> String {
    format!("{}/chat/completions", api_base)
}

fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request.bearer_auth(api_key)
}

fn build_body(messages: &[AiMessage], config: &AiModelConfig, stream: bool) -> AiResult<Value> {
    let request = ChatCompletionRequest {
        model: &config.model,
        messages: messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        top_p: config.top_p,
        frequency_penalty: config.frequency_penalty,
        presence_penalty: config.presence_penalty,
        stream,
    };

    serde_json::to_value(request)
        .map_err(|e| AiError::generation(format!("Failed to encode OpenAI request: {}", e)))
}

fn parse_response(body: &str, config: &AiModelConfig) -> AiResult<AiResponse> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        AiError::new(
            AiErrorCode::InvalidResponse,
            format!("Failed to parse OpenAI response: {}", e),
        )
    })?;

    let choice = response.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let content = choice
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            AiError::new(AiErrorCode::InvalidResponse, "No content in OpenAI response")
        })?;

    let usage = response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u
            .total_tokens
            .unwrap_or(u.prompt_tokens.saturating_add(u.completion_tokens)),
    });

    let mut result = AiResponse::new(content, response.model.unwrap_or_else(|| config.model.clone()))
        .with_usage(usage);
    if let Some(reason) = finish_reason {
        result.insert_metadata("finish_reason", Value::from(reason));
    }
    if let Some(id) = response.id {
        result.insert_metadata("id", Value::from(id));
    }
    Ok(result)
}

fn parse_error(body: &str) -> Option<VendorError> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(VendorError {
        code: response.error.code.or(response.error.error_type),
        message: response.error.message,
    })
}

fn parse_stream_delta(payload: &str) -> Result<Option<String>, serde_json::Error> {
    let chunk: StreamChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content))
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
