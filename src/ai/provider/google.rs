//! Google Generative Language profile
//!
//! `POST {base}/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header. System messages go
//! to `systemInstruction`; assistant turns use the `model` role.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AiMessage, AiModelConfig, AiResponse, ProviderKind, Role, Usage, VendorError, VendorProfile,
};
use crate::types::{AiError, AiErrorCode, AiResult};

pub(super) static PROFILE: VendorProfile = VendorProfile {
    kind: ProviderKind::Google,
    default_api_base: "https://generativelanguage.googleapis.com/v1beta",
    default_model: "gemini-1.5-pro",
    endpoint,
    authorize,
    build_body,
    parse_response,
    parse_error,
    parse_stream_delta: None,
};

fn endpoint(api_base: &str, config: &AiModelConfig, _stream: bool) -> String {
    format!("{}/models/{}:generateContent", api_base, config.model)
}

fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request.header("x-goog-api-key", api_key)
}

fn build_body(messages: &[AiMessage], config: &AiModelConfig, _stream: bool) -> AiResult<Value> {
    let system_text = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let contents = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Content {
            role: Some(if m.role == Role::Assistant { "model" } else { "user" }),
            parts: vec![Part { text: &m.content }],
        })
        .collect();

    let request = GenerateContentRequest {
        contents,
        system_instruction: (!system_text.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part { text: &system_text }],
        }),
        generation_config: GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
            top_p: config.top_p,
        },
    };

    serde_json::to_value(request)
        .map_err(|e| AiError::generation(format!("Failed to encode Google request: {}", e)))
}

fn parse_response(body: &str, config: &AiModelConfig) -> AiResult<AiResponse> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        AiError::new(
            AiErrorCode::InvalidResponse,
            format!("Failed to parse Google response: {}", e),
        )
    })?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AiError::new(AiErrorCode::InvalidResponse, "No candidates in Google response"))?;

    let content = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    let usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u
            .total_token_count
            .unwrap_or(u.prompt_token_count.saturating_add(u.candidates_token_count)),
    });

    let mut result = AiResponse::new(content, config.model.clone()).with_usage(usage);
    if let Some(reason) = candidate.finish_reason {
        result.insert_metadata("finish_reason", Value::from(reason));
    }
    Ok(result)
}

fn parse_error(body: &str) -> Option<VendorError> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(VendorError {
        code: response.error.status,
        message: response.error.message,
    })
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
