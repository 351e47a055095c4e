// http server mode - run sqlgate as an api

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::core::{self, Ai, Db};
use crate::Error;

/// Everything a request needs, built once at startup.
pub struct AppState {
    db: Db,
    ai: Ai,
    schema: String,
    context: String,
}

impl AppState {
    pub async fn load(db: Db, ai: Ai) -> Result<Self, Error> {
        let schema = db.schema().await?;
        let context = db.prompt_context(&schema);
        Ok(Self {
            db,
            ai,
            schema,
            context,
        })
    }
}

#[derive(Deserialize)]
struct QueryRequest {
    nl_query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    query_generated: String,
    columns: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
    row_count: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    provider: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    error_type: &'static str,
}

struct ApiError {
    status: StatusCode,
    detail: String,
    error_type: &'static str,
}

impl ApiError {
    fn new(status: StatusCode, error_type: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            error_type,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
                error_type: self.error_type,
            }),
        )
            .into_response()
    }
}

pub struct Server;

impl Server {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/query", post(query))
            .route("/api/schema", get(get_schema))
            .route("/api/tables", get(get_tables))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(state))
    }

    pub async fn run(state: AppState, host: &str, port: u16) -> Result<(), Error> {
        let app = Self::router(state);

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!("server running at http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        database: if connected { "connected" } else { "disconnected" },
        provider: state.ai.provider(),
    })
}

async fn get_schema(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let tables = state.db.tables().await.map_err(|e| {
        error!(error = %e, "failed to list tables");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
            format!("failed to retrieve schema: {e}"),
        )
    })?;

    Ok(Json(serde_json::json!({ "schema": state.schema, "tables": tables })))
}

async fn get_tables(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let tables = state.db.tables().await.map_err(|e| {
        error!(error = %e, "failed to list tables");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
            format!("failed to retrieve tables: {e}"),
        )
    })?;

    Ok(Json(serde_json::json!({ "tables": tables })))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let prompt = req.nl_query.trim();
    if prompt.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "nl_query must not be empty",
        ));
    }

    let preview: String = prompt.chars().take(100).collect();
    info!(nl_query = %preview, "query request");

    // ask the model
    let raw = state
        .ai
        .generate_sql(prompt, &state.context)
        .await
        .map_err(|e| {
            error!(error = %e, "sql generation failed");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "ai_error",
                format!("failed to generate SQL: {e}"),
            )
        })?;

    // nothing reaches the database without passing the gate
    let sql = core::guard(&raw).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, "unsafe_sql", e.to_string())
    })?;

    let result = state.db.execute(&sql).await.map_err(|e| match e {
        Error::TooManyRows { .. } => {
            warn!(error = %e, "result too large");
            ApiError::new(StatusCode::BAD_REQUEST, "too_many_rows", e.to_string())
        }
        e => {
            error!(error = %e, "query execution failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                format!("failed to execute query: {e}"),
            )
        }
    })?;

    info!(row_count = result.row_count, "query successful");

    Ok(Json(QueryResponse {
        query_generated: sql,
        columns: result.columns,
        data: result.rows,
        row_count: result.row_count,
    }))
}
