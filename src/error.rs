use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    #[diagnostic(code(sqlgate::database))]
    Database(#[from] sqlx::Error),

    #[error("{provider} API error: {message}")]
    #[diagnostic(code(sqlgate::ai))]
    Ai {
        provider: &'static str,
        message: String,
    },

    #[error("Missing API key for {provider}. Set one of: {vars}")]
    #[diagnostic(
        code(sqlgate::missing_api_key),
        help("pass --api-key or export one of the listed variables")
    )]
    MissingApiKey {
        provider: &'static str,
        vars: String,
    },

    #[error("Generated SQL is not safe: {0}")]
    #[diagnostic(code(sqlgate::unsafe_sql))]
    Unsafe(String),

    #[error("Query returned {count} rows, exceeding limit of {max}")]
    #[diagnostic(
        code(sqlgate::too_many_rows),
        help("narrow the question or raise --max-rows")
    )]
    TooManyRows { count: usize, max: usize },

    #[error("HTTP error: {0}")]
    #[diagnostic(code(sqlgate::http))]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(sqlgate::json))]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(sqlgate::io))]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    #[diagnostic(code(sqlgate::server))]
    Server(String),

    #[error("Logging setup failed: {0}")]
    #[diagnostic(code(sqlgate::logging))]
    Logging(String),
}
