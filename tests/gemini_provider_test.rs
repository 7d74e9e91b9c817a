use serde_json::{json, Value};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mathgenius::config::{GeminiConfig, SamplingSettings};
use mathgenius::curriculum::GradeLevel;
use mathgenius::gateway::{ModelGateway, ReplyOutcome, CHECK_ERROR_FALLBACK};
use mathgenius::providers::{
    ContentPart, GeminiProvider, GenerationRequest, Provider, SamplingConfig,
};
use mathgenius::session::{TurnOutcome, TutorSession};

const MODEL_PATH: &str = "/models/gemini-3-flash-preview:generateContent";

fn config_for(server: &MockServer) -> GeminiConfig {
    GeminiConfig {
        api_base: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout_seconds: 5,
        ..Default::default()
    }
}

fn reply_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 812,
            "candidatesTokenCount": 40,
            "totalTokenCount": 852
        }
    })
}

fn simple_request() -> GenerationRequest {
    GenerationRequest {
        system_instruction: "Bạn là gia sư Toán".to_string(),
        history: Vec::new(),
        parts: vec![ContentPart::text("Tìm x biết x + 5 = 3")],
        sampling: SamplingConfig::with_temperature(0.6),
    }
}

/// Successful call sends the key header and parses text plus usage
#[tokio::test]
async fn test_generate_posts_to_model_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Em thử trừ 5 ở hai vế nhé.")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config_for(&server)).unwrap();
    let response = provider.generate(&simple_request()).await.unwrap();

    assert_eq!(response.text.as_deref(), Some("Em thử trừ 5 ở hai vế nhé."));
    let usage = response.usage.unwrap();
    assert_eq!(usage.prompt_tokens, 812);
    assert_eq!(usage.completion_tokens, 40);
    assert_eq!(usage.total_tokens, 852);
}

/// Non-2xx status surfaces as a provider error carrying the status
#[tokio::test]
async fn test_generate_maps_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config_for(&server)).unwrap();
    let err = provider.generate(&simple_request()).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

/// A missing key fails before anything is sent
#[tokio::test]
async fn test_generate_without_key_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let config = GeminiConfig {
        api_key: None,
        ..config_for(&server)
    };
    let provider = GeminiProvider::new(config).unwrap();
    assert!(provider.generate(&simple_request()).await.is_err());
}

/// No candidates is a successful call with no text
#[tokio::test]
async fn test_generate_without_candidates_has_no_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config_for(&server)).unwrap();
    let response = provider.generate(&simple_request()).await.unwrap();
    assert!(response.text.is_none());
}

/// A tutoring turn puts the welcome entry, the system instruction and the
/// sampling settings on the wire
#[tokio::test]
async fn test_tutoring_turn_wire_format() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Em nghĩ sao?")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config_for(&server)).unwrap();
    let gateway = ModelGateway::new_boxed(Box::new(provider), SamplingSettings::default());
    let mut session = TutorSession::new(GradeLevel::Grade6, 1024);

    let outcome = session.send(&gateway, "Tìm x biết x + 5 = 3", None).await;
    match outcome {
        TurnOutcome::Replied(reply) => {
            assert_eq!(reply.outcome, ReplyOutcome::Generated);
            assert_eq!(reply.text, "Em nghĩ sao?");
        }
        other => panic!("expected a reply, got {:?}", other),
    }

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();

    let instruction = body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(instruction.contains("LỚP 6"));

    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0]["role"], "model");
    assert_eq!(contents[1]["role"], "user");
    assert_eq!(contents[1]["parts"][0]["text"], "Tìm x biết x + 5 = 3");

    let generation = &body["generationConfig"];
    assert!((generation["temperature"].as_f64().unwrap() - 0.6).abs() < 1e-6);
    assert_eq!(generation["topK"], 40);
    assert!((generation["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
}

/// Answer checking over a failing server yields its fallback
#[tokio::test]
async fn test_check_answer_falls_back_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config_for(&server)).unwrap();
    let gateway = ModelGateway::new_boxed(Box::new(provider), SamplingSettings::default());

    let feedback = gateway
        .check_answer("Tính $2 + 3$", "6", GradeLevel::Grade6)
        .await;
    assert_eq!(feedback, CHECK_ERROR_FALLBACK);
}
