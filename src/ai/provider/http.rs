//! Generic HTTP Provider
//!
//! One adapter for every vendor. Vendor differences (endpoint, auth, request
//! body, response and error decoding) live in a `VendorProfile` record; the
//! adapter owns transport, timeouts and error normalization.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::sse::{DeltaParser, delta_stream};
use super::{
    AiMessage, AiModelConfig, AiResponse, GenerateOptions, ProviderKind, ProviderSettings,
    TextProvider, TextStream,
};
use crate::ai::timeout::{default_timeout, with_timeout};
use crate::constants::network as net_constants;
use crate::types::{AiError, AiErrorCode, AiResult};

/// Code and message extracted from a vendor error body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Per-vendor request/response mapping
pub struct VendorProfile {
    pub kind: ProviderKind,
    pub default_api_base: &'static str,
    pub default_model: &'static str,
    /// Full request URL for a resolved config
    pub endpoint: fn(api_base: &str, config: &AiModelConfig, stream: bool) -> String,
    /// Attach credentials to the request
    pub authorize: fn(request: RequestBuilder, api_key: &str) -> RequestBuilder,
    /// Vendor request body
    pub build_body: fn(messages: &[AiMessage], config: &AiModelConfig, stream: bool) -> AiResult<Value>,
    /// Decode a 2xx body into the shared response shape
    pub parse_response: fn(body: &str, config: &AiModelConfig) -> AiResult<AiResponse>,
    /// Extract code/message from a non-2xx body; `None` when unparseable
    pub parse_error: fn(body: &str) -> Option<VendorError>,
    /// Decoder for streamed `data:` payloads, when the vendor streams
    pub parse_stream_delta: Option<DeltaParser>,
}

/// HTTP text-generation provider with secure API key handling
pub struct HttpProvider {
    profile: &'static VendorProfile,
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.profile.kind)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("settings", &self.settings)
            .finish()
    }
}

impl HttpProvider {
    /// Build the adapter. No network activity happens here.
    pub fn new(
        profile: &'static VendorProfile,
        api_key: Option<String>,
        settings: &ProviderSettings,
    ) -> AiResult<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AiError::missing_api_key(profile.kind))?;

        let api_base = settings
            .api_base
            .as_deref()
            .unwrap_or(profile.default_api_base)
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AiError::generation(format!("Failed to create HTTP client: {}", e))
                    .with_provider(profile.kind)
            })?;

        Ok(Self {
            profile,
            api_key: SecretString::from(api_key),
            api_base,
            settings: settings.clone(),
            client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn resolve(&self, options: &GenerateOptions) -> AiModelConfig {
        options
            .params
            .resolve(self.profile.kind, &self.settings, self.profile.default_model)
    }

    async fn send(&self, url: &str, body: &Value) -> AiResult<reqwest::Response> {
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);

        (self.profile.authorize)(request, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))
    }

    /// The request URL is stripped so credentials in it never reach the message
    fn transport_error(&self, err: reqwest::Error) -> AiError {
        let kind = self.profile.kind;
        let err = err.without_url();
        if err.is_timeout() {
            return AiError::new(
                AiErrorCode::RequestTimeout,
                format!("{} request timed out: {}", kind.display_name(), err),
            )
            .with_provider(kind);
        }
        AiError::generation(format!("{} request failed: {}", kind.display_name(), err))
            .with_provider(kind)
    }

    /// Map a non-2xx response to an error, degrading to a generic message
    /// when the vendor body cannot be parsed
    fn api_error(&self, status: StatusCode, body: &str) -> AiError {
        let kind = self.profile.kind;
        let parsed = (self.profile.parse_error)(body).unwrap_or_default();

        let code = parsed
            .code
            .filter(|c| !c.is_empty())
            .map(AiErrorCode::Vendor)
            .unwrap_or(AiErrorCode::ProviderApi(kind));
        let message = parsed.message.unwrap_or_else(|| {
            format!(
                "{} API request failed with status {}",
                kind.display_name(),
                status.as_u16()
            )
        });

        let details = serde_json::from_str::<Value>(body)
            .unwrap_or_else(|_| serde_json::json!({ "body": body.chars().take(500).collect::<String>() }));

        AiError::new(code, message)
            .with_status(status.as_u16())
            .with_details(details)
            .with_provider(kind)
    }
}

#[async_trait]
impl TextProvider for HttpProvider {
    fn kind(&self) -> ProviderKind {
        self.profile.kind
    }

    fn model(&self) -> &str {
        self.settings
            .model
            .as_deref()
            .unwrap_or(self.profile.default_model)
    }

    async fn generate_text(&self, options: &GenerateOptions) -> AiResult<AiResponse> {
        let kind = self.profile.kind;
        let config = self.resolve(options);
        let timeout = options.timeout.unwrap_or_else(default_timeout);

        info!(
            "Generating with {} (model: {}, temperature: {})",
            kind.display_name(),
            config.model,
            config.temperature
        );

        let url = (self.profile.endpoint)(&self.api_base, &config, false);
        let body = (self.profile.build_body)(&options.messages, &config, false)?;
        let start_time = Instant::now();

        debug!("Sending request to {} API", kind.display_name());

        let (status, text) = with_timeout(timeout, kind, async {
            let response = self.send(&url, &body).await?;
            let status = response.status();
            let text = response.text().await.map_err(|e| self.transport_error(e))?;
            Ok((status, text))
        })
        .await?;

        let elapsed = start_time.elapsed();

        if !status.is_success() {
            let err = self.api_error(status, &text);
            warn!("{} API error ({}): {}", kind.display_name(), status, err.message);
            return Err(err);
        }

        let mut response = (self.profile.parse_response)(&text, &config)
            .map_err(|e| e.with_provider(kind))?;
        response.insert_metadata("provider", Value::from(kind.as_str()));
        response.insert_metadata("latency_ms", Value::from(elapsed.as_millis() as u64));

        debug!(
            "Received response from {} in {}ms",
            kind.display_name(),
            elapsed.as_millis()
        );

        Ok(response)
    }

    async fn stream_text(&self, options: &GenerateOptions) -> AiResult<TextStream> {
        let kind = self.profile.kind;
        let Some(parse_delta) = self.profile.parse_stream_delta else {
            return Err(AiError::new(
                AiErrorCode::StreamingNotSupported,
                format!("{} does not support streaming", kind.display_name()),
            )
            .with_provider(kind));
        };

        let config = self.resolve(options);
        let timeout = options.timeout.unwrap_or_else(default_timeout);

        info!(
            "Streaming with {} (model: {})",
            kind.display_name(),
            config.model
        );

        let url = (self.profile.endpoint)(&self.api_base, &config, true);
        let body = (self.profile.build_body)(&options.messages, &config, true)?;

        let response = with_timeout(timeout, kind, self.send(&url, &body)).await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.api_error(status, &text));
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(reqwest::Error::without_url));
        Ok(delta_stream(bytes, parse_delta, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{AiMessage, ModelParams};
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ProviderSettings {
        ProviderSettings {
            api_base: Some(server.uri()),
            ..Default::default()
        }
    }

    fn options() -> GenerateOptions {
        GenerateOptions::new(vec![
            AiMessage::system("You are a script reader."),
            AiMessage::user("Summarize: FADE IN."),
        ])
    }

    #[test]
    fn test_missing_api_key_fails_before_network() {
        let settings = ProviderSettings::default();
        for kind in ProviderKind::ALL {
            let err = HttpProvider::new(kind.profile(), None, &settings).unwrap_err();
            assert_eq!(err.code, AiErrorCode::MissingApiKey);
            assert_eq!(err.status_code, Some(400));

            let blank = HttpProvider::new(kind.profile(), Some("  ".into()), &settings).unwrap_err();
            assert_eq!(blank.code, AiErrorCode::MissingApiKey);
        }
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let settings = ProviderSettings {
            api_base: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };
        let provider =
            HttpProvider::new(ProviderKind::OpenAi.profile(), Some("k".into()), &settings).unwrap();
        assert_eq!(provider.api_base(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = HttpProvider::new(
            ProviderKind::OpenAi.profile(),
            Some("sk-very-secret".into()),
            &ProviderSettings::default(),
        )
        .unwrap();
        assert!(!format!("{:?}", provider).contains("sk-very-secret"));
    }

    #[tokio::test]
    async fn test_openai_generate_maps_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": "gpt-test", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-test-0613",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "A tight thriller."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::OpenAi.profile(),
            Some("test-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let response = provider
            .generate_text(&options().with_model("gpt-test"))
            .await
            .unwrap();

        assert_eq!(response.content, "A tight thriller.");
        assert_eq!(response.model, "gpt-test-0613");
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 4);
        assert_eq!(usage.total_tokens, 16);
        let metadata = response.metadata.unwrap();
        assert_eq!(metadata["provider"], "openai");
        assert_eq!(metadata["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn test_openai_error_body_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "message": "Rate limit reached for requests",
                    "type": "requests",
                    "code": "rate_limit_exceeded"
                }
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::OpenAi.profile(),
            Some("test-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let err = provider.generate_text(&options()).await.unwrap_err();
        assert_eq!(err.code, AiErrorCode::Vendor("rate_limit_exceeded".into()));
        assert_eq!(err.message, "Rate limit reached for requests");
        assert_eq!(err.status_code, Some(429));
        assert!(err.details.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_error_body_degrades_to_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/complete"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::Anthropic.profile(),
            Some("test-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let err = provider.generate_text(&options()).await.unwrap_err();
        assert_eq!(err.code, AiErrorCode::ProviderApi(ProviderKind::Anthropic));
        assert!(err.to_string().contains("ANTHROPIC_API_ERROR"));
        assert_eq!(err.status_code, Some(502));
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn test_anthropic_complete_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/complete"))
            .and(header("x-api-key", "anthropic-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"max_tokens_to_sample": 256, "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "completion": " The second act sags.",
                "stop_reason": "stop_sequence",
                "model": "claude-2.1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::Anthropic.profile(),
            Some("anthropic-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let response = provider
            .generate_text(&options().with_max_tokens(256))
            .await
            .unwrap();
        assert_eq!(response.content, "The second act sags.");
        assert_eq!(response.model, "claude-2.1");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_google_generate_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "google-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Strong "}, {"text": "premise."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 3, "totalTokenCount": 33}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::Google.profile(),
            Some("google-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let mut opts = options();
        opts.params = ModelParams {
            model: Some("gemini-test".into()),
            ..Default::default()
        };
        let response = provider.generate_text(&opts).await.unwrap();
        assert_eq!(response.content, "Strong premise.");
        assert_eq!(response.model, "gemini-test");
        assert_eq!(response.usage.unwrap().total_tokens, 33);
    }

    #[tokio::test]
    async fn test_connection_error_hides_api_key() {
        let settings = ProviderSettings {
            api_base: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        };
        let provider = HttpProvider::new(
            ProviderKind::Google.profile(),
            Some("SECRET-GOOGLE-KEY".into()),
            &settings,
        )
        .unwrap();

        let err = provider.generate_text(&options()).await.unwrap_err();
        assert_eq!(err.provider, Some(ProviderKind::Google));
        assert!(!err.to_string().contains("SECRET-GOOGLE-KEY"));
        assert!(!format!("{:?}", err).contains("SECRET-GOOGLE-KEY"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::OpenAi.profile(),
            Some("test-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let err = provider
            .generate_text(&options().with_timeout(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert_eq!(err.code, AiErrorCode::RequestTimeout);
        assert_eq!(err.status_code, Some(408));
    }

    #[tokio::test]
    async fn test_openai_stream_yields_deltas() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"INT. \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"KITCHEN\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            ProviderKind::OpenAi.profile(),
            Some("test-key".into()),
            &settings_for(&server),
        )
        .unwrap();

        let stream = provider.stream_text(&options()).await.unwrap();
        let deltas: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
        assert_eq!(deltas, vec!["INT. ".to_string(), "KITCHEN".to_string()]);
    }

    #[tokio::test]
    async fn test_google_stream_not_supported() {
        let provider = HttpProvider::new(
            ProviderKind::Google.profile(),
            Some("google-key".into()),
            &ProviderSettings::default(),
        )
        .unwrap();

        let err = provider.stream_text(&options()).await.err().unwrap();
        assert_eq!(err.code, AiErrorCode::StreamingNotSupported);
    }
}
