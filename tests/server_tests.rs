// tests for the http api, driven through the router with a canned model
// uses an in-memory sqlite database, no network needed

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use sqlgate::{Ai, AppState, Db, Error, Server, SqlGenerator};
use tower::ServiceExt;

struct Canned(Result<&'static str, &'static str>);

#[async_trait]
impl SqlGenerator for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn generate_sql(&self, _prompt: &str, _schema: &str) -> Result<String, Error> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(Error::Ai {
                provider: "canned",
                message: message.to_string(),
            }),
        }
    }
}

async fn app(reply: Result<&'static str, &'static str>, max_rows: usize) -> Router {
    let db = Db::connect("sqlite::memory:", max_rows).await.unwrap();
    let ai = Ai::from_generator(Canned(reply));
    Server::router(AppState::load(db, ai).await.unwrap())
}

async fn ask(app: Router, nl_query: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/query")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "nl_query": nl_query }).to_string()))
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(Ok("SELECT 1"), 1000).await;
    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["provider"], "canned");
}

#[tokio::test]
async fn test_query_runs_sanitized_sql() {
    let app = app(Ok("Here you go:\n```sql\nSELECT 1 AS one -- the answer\n```"), 1000).await;
    let (status, body) = ask(app, "give me one").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query_generated"], "SELECT 1 AS one");
    assert_eq!(body["columns"], json!(["one"]));
    assert_eq!(body["data"], json!([[1]]));
    assert_eq!(body["row_count"], 1);
}

#[tokio::test]
async fn test_unsafe_sql_is_blocked() {
    let app = app(Ok("SELECT * FROM users; DROP TABLE users"), 1000).await;
    let (status, body) = ask(app, "drop everything").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "unsafe_sql");
    assert!(body["detail"].as_str().unwrap().contains("not safe"));
}

#[tokio::test]
async fn test_select_into_is_blocked() {
    let app = app(Ok("SELECT * INTO copy FROM users"), 1000).await;
    let (status, body) = ask(app, "copy users").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("INTO"));
}

#[tokio::test]
async fn test_empty_question() {
    let app = app(Ok("SELECT 1"), 1000).await;
    let (status, body) = ask(app, "   ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "bad_request");
}

#[tokio::test]
async fn test_model_failure() {
    let app = app(Err("rate limited"), 1000).await;
    let (status, body) = ask(app, "anything").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_type"], "ai_error");
    assert!(body["detail"].as_str().unwrap().contains("rate limited"));
}

#[tokio::test]
async fn test_row_ceiling() {
    let app = app(Ok("SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3"), 2).await;
    let (status, body) = ask(app, "three rows").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "too_many_rows");
    assert!(body["detail"].as_str().unwrap().contains("exceeding limit of 2"));
}

#[tokio::test]
async fn test_bad_sql_reports_database_error() {
    let app = app(Ok("SELECT * FROM no_such_table"), 1000).await;
    let (status, body) = ask(app, "missing table").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "database_error");
}

#[tokio::test]
async fn test_tables_and_schema() {
    let app = app(Ok("SELECT 1"), 1000).await;

    let (status, body) = send(app.clone(), get("/api/tables")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"], json!([]));

    let (status, body) = send(app, get("/api/schema")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schema"], "");
}
