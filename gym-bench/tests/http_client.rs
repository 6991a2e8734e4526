//! HTTP client tests against an in-process chat completions responder.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use gym_bench::config::Credentials;
use gym_bench::providers::{Backend, ClientFactory, HttpClientFactory, ModelConfig, ProviderError};
use gym_bench::questions::{Category, Difficulty, Question};
use gym_bench::runner::{Evaluator, EvaluatorConfig};

/// Serve canned responses, one per connection, and forward each raw request
async fn spawn_responder(responses: Vec<(u16, String)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (format!("http://{}/v1", addr), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "llama3",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 61, "completion_tokens": 1, "total_tokens": 62 }
    })
    .to_string()
}

fn factory_for(base_url: &str) -> HttpClientFactory {
    HttpClientFactory::new(Credentials::default().with_base_url(Backend::Ollama, base_url))
}

fn knee_question() -> Question {
    Question::new(
        "anat-001",
        "Which muscle extends the knee?",
        ["Hamstrings", "Quadriceps", "Gastrocnemius", "Adductors"],
        1,
        Category::Anatomy,
        Difficulty::Easy,
    )
}

#[tokio::test]
async fn test_completion_round_trip() {
    let (base_url, mut requests) = spawn_responder(vec![(200, completion(" B "))]).await;
    let client = factory_for(&base_url)
        .create(&ModelConfig::new(Backend::Ollama, "llama3"))
        .unwrap();

    let response = client.complete("Which muscle extends the knee?").await.unwrap();
    assert_eq!(response.content, " B ");
    assert_eq!(response.model, "llama3");
    assert_eq!(response.finish_reason, "stop");
    assert_eq!(response.usage.map(|u| u.total), Some(62));

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(request.contains("\"model\":\"llama3\""));
    assert!(request.contains("\"max_tokens\":10"));
    assert!(!request.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_gateway_headers_and_bearer() {
    let (base_url, mut requests) = spawn_responder(vec![(200, completion("A"))]).await;
    let credentials = Credentials::default()
        .with_api_key(Backend::OpenRouter, "sk-or-test")
        .with_base_url(Backend::OpenRouter, &base_url);
    let client = HttpClientFactory::new(credentials)
        .create(&ModelConfig::new(Backend::OpenRouter, "meta-llama/llama-3-8b-instruct:free"))
        .unwrap();

    client.complete("hello").await.unwrap();

    let request = requests.recv().await.unwrap().to_lowercase();
    assert!(request.contains("authorization: bearer sk-or-test"));
    assert!(request.contains("http-referer:"));
    assert!(request.contains("x-title: gym ai benchmark"));
}

#[tokio::test]
async fn test_api_error_status() {
    let body = r#"{"error":{"message":"Rate limit exceeded"}}"#.to_string();
    let (base_url, _requests) = spawn_responder(vec![(429, body)]).await;
    let client = factory_for(&base_url)
        .create(&ModelConfig::new(Backend::Ollama, "llama3"))
        .unwrap();

    match client.complete("hello").await {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("expected API error, got {:?}", other.map(|r| r.content)),
    }
}

#[tokio::test]
async fn test_evaluator_over_http() {
    let (base_url, _requests) =
        spawn_responder(vec![(200, completion("b) Quadriceps")), (200, completion("C"))]).await;
    let client = factory_for(&base_url)
        .create(&ModelConfig::new(Backend::Ollama, "llama3"))
        .unwrap();

    let questions = vec![knee_question(), knee_question()];
    let result = Evaluator::new(Arc::clone(&client), EvaluatorConfig::default())
        .evaluate(&questions)
        .await
        .unwrap();

    assert_eq!(result.model_name, "llama3");
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.accuracy, 50.0);
    assert_eq!(result.results[0].model_answer, "B");
    assert_eq!(result.results[1].model_answer, "C");
    assert_eq!(result.total_tokens, Some(124));
}
