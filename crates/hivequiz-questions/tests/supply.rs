//! Integration tests for the question supply: retry policy with scripted
//! sources, and the Open Trivia DB client against a local HTTP stub.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hivequiz_questions::{
    OpenTdbSource, Question, QuestionRequest, QuestionSource, ResilientSource, SupplyConfig,
    SupplyError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn request(amount: u32) -> QuestionRequest {
    QuestionRequest {
        amount,
        difficulties: vec!["medium".into()],
        categories: vec![],
    }
}

/// Replays a fixed sequence of outcomes, one per call.
struct Scripted {
    outcomes: Mutex<VecDeque<Result<Vec<Question>, SupplyError>>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(outcomes: Vec<Result<Vec<Question>, SupplyError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuestionSource for Scripted {
    async fn fetch(&self, _request: &QuestionRequest) -> Result<Vec<Question>, SupplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SupplyError::Empty))
    }
}

fn upstream_question() -> Question {
    Question::new("Upstream?", "Live", "Yes", ["No", "Maybe", "Later"])
}

// =========================================================================
// ResilientSource
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_success_passes_through() {
    let source = ResilientSource::new(
        Scripted::new(vec![Ok(vec![upstream_question()])]),
        Duration::from_secs(5),
    );
    let questions = source.fetch(&request(1)).await.unwrap();
    assert_eq!(questions[0].category, "Live");
    assert_eq!(source.inner().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_short_result_is_topped_up_from_offline() {
    let source = ResilientSource::new(
        Scripted::new(vec![Ok(vec![upstream_question()])]),
        Duration::from_secs(5),
    );
    let questions = source.fetch(&request(3)).await.unwrap();

    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].category, "Live");
    assert!(questions[1..].iter().all(|q| q.category == "Backup Mode"));
    assert_eq!(source.inner().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_then_retries_once() {
    let source = ResilientSource::new(
        Scripted::new(vec![
            Err(SupplyError::RateLimited),
            Ok(vec![upstream_question()]),
        ]),
        Duration::from_secs(5),
    );
    let start = tokio::time::Instant::now();
    let questions = source.fetch(&request(1)).await.unwrap();

    assert_eq!(questions[0].category, "Live");
    assert_eq!(source.inner().calls(), 2);
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_failed_retry_falls_back_to_offline() {
    let source = ResilientSource::new(
        Scripted::new(vec![
            Err(SupplyError::RateLimited),
            Err(SupplyError::RateLimited),
        ]),
        Duration::from_secs(5),
    );
    let questions = source.fetch(&request(6)).await.unwrap();
    assert_eq!(questions.len(), 6);
    assert!(questions.iter().all(|q| q.category == "Backup Mode"));
    assert_eq!(source.inner().calls(), 2, "only one retry");
}

#[tokio::test(start_paused = true)]
async fn test_other_failure_falls_back_without_retry() {
    let source = ResilientSource::new(
        Scripted::new(vec![Err(SupplyError::Upstream(1))]),
        Duration::from_secs(5),
    );
    let start = tokio::time::Instant::now();
    let questions = source.fetch(&request(3)).await.unwrap();

    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.category == "Backup Mode"));
    assert_eq!(source.inner().calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

// =========================================================================
// OpenTdbSource against a local stub
// =========================================================================

/// Serves each canned `(status line, body)` pair to one connection, in
/// order, and records the request lines it saw.
async fn stub_upstream(responses: Vec<(&'static str, String)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap();
            let head = String::from_utf8_lossy(&buf[..n]).to_string();
            seen.push(head.lines().next().unwrap_or_default().to_string());

            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        seen
    });

    (format!("http://{addr}/api.php"), handle)
}

fn api_body(count: usize) -> String {
    let results: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"category":"Art","type":"multiple","difficulty":"medium","question":"Q{i} &amp; more","correct_answer":"A","incorrect_answers":["B","C","D"]}}"#
            )
        })
        .collect();
    format!(r#"{{"response_code":0,"results":[{}]}}"#, results.join(","))
}

fn client(base_url: String, max_batch: u32) -> OpenTdbSource {
    OpenTdbSource::new(SupplyConfig {
        base_url,
        max_batch,
        ..SupplyConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_opentdb_single_batch() {
    let (url, server) = stub_upstream(vec![("200 OK", api_body(3))]).await;
    let source = client(url, 50);

    let questions = source.fetch(&request(3)).await.unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].text, "Q0 & more");
    assert_eq!(questions[0].answers.len(), 4);

    let seen = server.await.unwrap();
    assert!(seen[0].contains("amount=3"));
    assert!(seen[0].contains("type=multiple"));
    assert!(seen[0].contains("difficulty=medium"));
}

#[tokio::test]
async fn test_opentdb_splits_into_batches() {
    let (url, server) =
        stub_upstream(vec![("200 OK", api_body(2)), ("200 OK", api_body(1))]).await;
    let source = client(url, 2);

    let questions = source.fetch(&request(3)).await.unwrap();
    assert_eq!(questions.len(), 3);

    let seen = server.await.unwrap();
    assert!(seen[0].contains("amount=2"));
    assert!(seen[1].contains("amount=1"));
}

#[tokio::test]
async fn test_opentdb_keeps_earlier_batches_when_a_later_one_fails() {
    let (url, server) = stub_upstream(vec![
        ("200 OK", api_body(2)),
        ("500 Internal Server Error", "{}".into()),
    ])
    .await;
    let source = client(url, 2);

    let questions = source.fetch(&request(4)).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].text, "Q1 & more");

    let seen = server.await.unwrap();
    assert_eq!(seen.len(), 2);
}

#[tokio::test]
async fn test_opentdb_maps_429_to_rate_limited() {
    let (url, _server) = stub_upstream(vec![("429 Too Many Requests", "{}".into())]).await;
    let err = client(url, 50).fetch(&request(1)).await.unwrap_err();
    assert!(matches!(err, SupplyError::RateLimited));
}

#[tokio::test]
async fn test_opentdb_maps_response_code() {
    let (url, _server) =
        stub_upstream(vec![("200 OK", r#"{"response_code":1,"results":[]}"#.into())]).await;
    let err = client(url, 50).fetch(&request(5)).await.unwrap_err();
    assert!(matches!(err, SupplyError::Upstream(1)));
}

#[tokio::test]
async fn test_opentdb_empty_results_is_error() {
    let (url, _server) =
        stub_upstream(vec![("200 OK", r#"{"response_code":0,"results":[]}"#.into())]).await;
    let err = client(url, 50).fetch(&request(5)).await.unwrap_err();
    assert!(matches!(err, SupplyError::Empty));
}
