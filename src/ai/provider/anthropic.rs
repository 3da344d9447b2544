//! Anthropic Text Completions profile
//!
//! `POST {base}/complete` with `x-api-key`. Messages are flattened into the
//! `Human:` / `Assistant:` prompt format.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AiMessage, AiModelConfig, AiResponse, ProviderKind, Role, Usage, VendorError, VendorProfile,
};
use crate::types::{AiError, AiErrorCode, AiResult};

const API_VERSION: &str = "2023-06-01";
const HUMAN_PROMPT: &str = "\n\nHuman:";
const AI_PROMPT: &str = "\n\nAssistant:";

pub(super) static PROFILE: VendorProfile = VendorProfile {
    kind: ProviderKind::Anthropic,
    default_api_base: "https://api.anthropic.com/v1",
    default_model: "claude-2.1",
    endpoint,
    authorize,
    build_body,
    parse_response,
    parse_error,
    parse_stream_delta: None,
};

fn endpoint(api_base: &str, _config: &AiModelConfig, _stream: bool) -> String {
    format!("{}/complete", api_base)
}

fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
}

/// Flatten messages into a single completion prompt
///
/// System content leads the prompt, user turns become `Human:` and assistant
/// turns `Assistant:`; the prompt always ends with an open `Assistant:` turn.
fn build_prompt(messages: &[AiMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        match message.role {
            Role::System => {
                if !prompt.is_empty() {
                    prompt.push_str("\n\n");
                }
                prompt.push_str(&message.content);
            }
            Role::User => {
                prompt.push_str(HUMAN_PROMPT);
                prompt.push(' ');
                prompt.push_str(&message.content);
            }
            Role::Assistant => {
                prompt.push_str(AI_PROMPT);
                prompt.push(' ');
                prompt.push_str(&message.content);
            }
        }
    }
    prompt.push_str(AI_PROMPT);
    prompt
}

fn build_body(messages: &[AiMessage], config: &AiModelConfig, stream: bool) -> AiResult<Value> {
    let request = CompleteRequest {
        model: &config.model,
        prompt: build_prompt(messages),
        max_tokens_to_sample: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
        stream,
    };

    serde_json::to_value(request)
        .map_err(|e| AiError::generation(format!("Failed to encode Anthropic request: {}", e)))
}

fn parse_response(body: &str, config: &AiModelConfig) -> AiResult<AiResponse> {
    let response: CompleteResponse = serde_json::from_str(body).map_err(|e| {
        AiError::new(
            AiErrorCode::InvalidResponse,
            format!("Failed to parse Anthropic response: {}", e),
        )
    })?;

    let usage = response
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens));

    let mut result = AiResponse::new(
        response.completion.trim_start(),
        response.model.unwrap_or_else(|| config.model.clone()),
    )
    .with_usage(usage);
    if let Some(reason) = response.stop_reason {
        result.insert_metadata("stop_reason", Value::from(reason));
    }
    Ok(result)
}

fn parse_error(body: &str) -> Option<VendorError> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(VendorError {
        code: response.error.error_type,
        message: response.error.message,
    })
}

// Request/Response types

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    completion: String,
    stop_reason: Option<String>,
    model: Option<String>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ModelParams, ProviderSettings};

    #[test]
    fn test_build_prompt_order() {
        let prompt = build_prompt(&[
            AiMessage::system("Be concise."),
            AiMessage::user("Title: X"),
            AiMessage::assistant("Noted."),
            AiMessage::user("FADE IN."),
        ]);
        assert_eq!(
            prompt,
            "Be concise.\n\nHuman: Title: X\n\nAssistant: Noted.\n\nHuman: FADE IN.\n\nAssistant:"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let config = ModelParams::default().resolve(
            ProviderKind::Anthropic,
            &ProviderSettings::default(),
            "claude-2.1",
        );
        let body = build_body(&[AiMessage::user("hi")], &config, false).unwrap();
        assert_eq!(body["model"], "claude-2.1");
        assert_eq!(body["prompt"], "\n\nHuman: hi\n\nAssistant:");
        assert_eq!(body["max_tokens_to_sample"], 4096);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_parse_response_maps_usage() {
        let config = ModelParams::default().resolve(
            ProviderKind::Anthropic,
            &ProviderSettings::default(),
            "claude-2.1",
        );
        let response = parse_response(
            r#"{"completion":" Hello","stop_reason":"max_tokens","usage":{"input_tokens":7,"output_tokens":2}}"#,
            &config,
        )
        .unwrap();
        assert_eq!(response.content, "Hello");
        assert_eq!(response.model, "claude-2.1");
        assert_eq!(response.usage, Some(Usage::new(7, 2)));
    }

    #[test]
    fn test_parse_error() {
        let parsed = parse_error(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.code.as_deref(), Some("overloaded_error"));
        assert_eq!(parsed.message.as_deref(), Some("Overloaded"));
    }
}
