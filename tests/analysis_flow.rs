//! End-to-end analysis against a mock vendor server.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scriptgenius::ai::service::{AiService, Credentials};
use scriptgenius::{
    AiConfig, AiErrorCode, AnalysisRequest, ChunkingOptions, ProviderKind, ScriptAnalyzer,
    ScriptContext, ScriptError, prepare_conversations,
};
use scriptgenius::script::ScriptChunker;

fn scene(n: usize) -> String {
    format!(
        "INT. ROOM {} - NIGHT\n\n{}",
        n,
        "Rain taps the window while the detective waits. ".repeat(4)
    )
}

fn long_script() -> String {
    (1..=4).map(scene).collect::<Vec<_>>().join("\n\n")
}

fn openai_reply() -> serde_json::Value {
    json!({
        "model": "gpt-4o",
        "choices": [{"message": {"role": "assistant", "content": "  Notes.  "}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 6, "total_tokens": 16}
    })
}

fn config_for(server: &MockServer) -> AiConfig {
    let mut config = AiConfig::default();
    config.openai.api_base = Some(server.uri());
    config.anthropic.api_base = Some(server.uri());
    config
}

async fn openai_analyzer(server: &MockServer, chunking: ChunkingOptions) -> ScriptAnalyzer {
    let credentials = Credentials::new().with_key(ProviderKind::OpenAi, "sk-test");
    let service = AiService::new(&credentials, &config_for(server)).into_shared();
    ScriptAnalyzer::new(service, chunking).unwrap()
}

#[tokio::test]
async fn short_script_is_sent_whole() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = openai_analyzer(&server, ChunkingOptions::default()).await;
    let request = AnalysisRequest::new(scene(1))
        .with_report_type("dialogue-analysis")
        .with_context(ScriptContext::new().with_title("Night Shift"));

    let report = analyzer.analyze(&request).await.unwrap();
    assert_eq!(report.content, "Notes.");
    assert_eq!(report.parts.len(), 1);
    assert_eq!(report.provider, ProviderKind::OpenAi);
    assert_eq!(report.usage.unwrap().total_tokens, 16);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!body.contains("[Part"));
    assert!(body.contains("Night Shift"));
}

#[tokio::test]
async fn long_script_is_analyzed_in_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply()))
        .mount(&server)
        .await;

    let analyzer = openai_analyzer(&server, ChunkingOptions::new(80, 10).unwrap()).await;
    let report = analyzer
        .analyze(&AnalysisRequest::new(long_script()))
        .await
        .unwrap();

    let parts = report.parts.len();
    assert!(parts > 1);
    assert_eq!(report.content, vec!["Notes."; parts].join("\n\n"));
    assert_eq!(report.usage.unwrap().total_tokens, 16 * parts as u32);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), parts);
    for (i, request) in requests.iter().enumerate() {
        let body = String::from_utf8(request.body.clone()).unwrap();
        assert!(body.contains(&format!("[Part {} of {}]", i + 1, parts)));
    }
}

#[tokio::test]
async fn failing_part_aborts_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream overloaded", "code": "server_error"}
        })))
        .mount(&server)
        .await;

    let analyzer = openai_analyzer(&server, ChunkingOptions::new(80, 10).unwrap()).await;
    let err = analyzer
        .analyze(&AnalysisRequest::new(long_script()))
        .await
        .unwrap_err();

    let ai = err.as_ai().unwrap();
    assert_eq!(ai.code, AiErrorCode::Vendor("server_error".to_string()));
    assert_eq!(ai.status_code, Some(500));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unregistered_provider_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/complete"))
        .and(header("x-api-key", "ant-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completion": " Solid coverage.",
            "stop_reason": "stop_sequence"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::new().with_key(ProviderKind::Anthropic, "ant-test");
    let service = AiService::new(&credentials, &config_for(&server)).into_shared();
    let analyzer = ScriptAnalyzer::new(service.clone(), ChunkingOptions::default()).unwrap();
    let request = AnalysisRequest::new(scene(1));

    // Default provider (openai) has no key
    let err = analyzer.analyze(&request).await.unwrap_err();
    assert_eq!(err.as_ai().unwrap().code, AiErrorCode::ProviderNotAvailable);

    let report = analyzer
        .analyze(&request.clone().with_provider(Some(ProviderKind::Anthropic)))
        .await
        .unwrap();
    assert_eq!(report.content, "Solid coverage.");
    assert_eq!(report.model, "claude-2.1");

    assert!(service.set_default_provider(ProviderKind::Google).is_err());
    service.set_default_provider(ProviderKind::Anthropic).unwrap();
    assert_eq!(service.default_provider(), ProviderKind::Anthropic);
}

#[tokio::test]
async fn stream_yields_deltas_in_order() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Act one \"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lands.\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let analyzer = openai_analyzer(&server, ChunkingOptions::default()).await;
    let stream = analyzer.stream(&AnalysisRequest::new(scene(2))).unwrap();
    let text: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
    assert_eq!(text.concat(), "Act one lands.");
}

#[test]
fn prepared_conversations_follow_message_layout() {
    let chunker = ScriptChunker::new(ChunkingOptions::default()).unwrap();
    let request = AnalysisRequest::new(scene(1))
        .with_report_type("market-analysis")
        .with_persona("streaming");

    let (_, conversations) = prepare_conversations(&chunker, &request).unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].len(), 5);

    let unknown = AnalysisRequest::new(scene(1)).with_report_type("horoscope");
    assert!(matches!(
        prepare_conversations(&chunker, &unknown),
        Err(ScriptError::UnknownReportType(_))
    ));

    assert!(matches!(
        prepare_conversations(&chunker, &AnalysisRequest::new("   ")),
        Err(ScriptError::Input(_))
    ));
}
