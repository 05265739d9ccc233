// tests/enrich_gemini.rs
//! Wire-level behavior of the Gemini enrichment client against a mock
//! backend: fence stripping, auth query parameter, and hard errors.

use content_collector::enrich::gemini::GeminiEnricher;
use content_collector::enrich::{Difficulty, Enricher};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{ "text": text }]
            }
        }]
    })
}

#[tokio::test]
async fn fenced_response_decodes_like_unwrapped_json() {
    let server = MockServer::start().await;
    let fenced = "```json\n{\"summary\": \"A test summary.\", \"tags\": [\"Go\", \"Testing\"], \"difficulty\": \"Beginner\"}\n```";
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(query_param("key", "test-api-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_body(fenced)))
        .mount(&server)
        .await;

    let client = GeminiEnricher::new("test-api-key")
        .with_endpoint(format!("{}/generate", server.uri()));

    let result = client.enrich("Test Title", "Test Description").await.unwrap();
    assert_eq!(result.summary, "A test summary.");
    assert_eq!(result.tags, vec!["Go", "Testing"]);
    assert_eq!(result.difficulty, Difficulty::Beginner);
}

#[tokio::test]
async fn non_200_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = GeminiEnricher::new("k").with_endpoint(server.uri());
    let err = client.enrich("Title", "Desc").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn missing_candidates_is_a_hard_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&server)
        .await;

    let client = GeminiEnricher::new("k").with_endpoint(server.uri());
    let err = client.enrich("Title", "Desc").await.unwrap_err();
    assert!(err.to_string().contains("no content"));
}

#[tokio::test]
async fn undecodable_result_is_a_hard_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(backend_body("Sorry, I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let client = GeminiEnricher::new("k").with_endpoint(server.uri());
    assert!(client.enrich("Title", "Desc").await.is_err());
}
