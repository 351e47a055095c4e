// sql safety gate
// the only thing standing between model output and the database,
// so every write, ddl, exec and multi-statement trick gets turned away

use crate::Error;
use crate::core::sanitize;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

/// Keywords that reject a query wherever they appear as a whole word.
/// Scanned in this order, so the first one listed is the one reported.
pub const DENY_LIST: &[&str] = &[
    // data
    "INSERT",
    "UPDATE",
    "DELETE",
    // schema
    "DROP",
    "TRUNCATE",
    "ALTER",
    "CREATE",
    // execution
    "EXEC",
    "EXECUTE",
    "MERGE",
    // privileges
    "GRANT",
    "REVOKE",
    "DENY",
    // procedures
    "SP_EXECUTESQL",
    "XP_CMDSHELL",
    "SP_CONFIGURE",
    // admin
    "BACKUP",
    "RESTORE",
    "SHUTDOWN",
    "DBCC",
];

/// Default ceiling on rows returned by an executed query.
pub const DEFAULT_MAX_ROWS: usize = 1000;

static STARTS_WITH_SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SELECT\b").expect("select pattern"));

static DENIED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DENY_LIST
        .iter()
        .map(|kw| {
            let pattern = format!(r"\b{}\b", regex::escape(kw));
            (*kw, Regex::new(&pattern).expect("deny-list pattern"))
        })
        .collect()
});

static INTO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bINTO\b").expect("into pattern"));

/// Why a candidate was turned away. One per check, in check order.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("query is empty")]
    Empty,

    #[error("query must start with SELECT")]
    NotSelect,

    #[error("dangerous keyword detected: {0}")]
    Keyword(&'static str),

    #[error("multiple statements are not allowed")]
    MultipleStatements,

    #[error("sql comments are not allowed")]
    Comment,

    #[error("SELECT INTO is not allowed")]
    SelectInto,
}

/// Outcome of [`validate`]. `reason` is empty exactly when `accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: String,
}

impl Verdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: String::new(),
        }
    }

    pub fn reject(rejection: &Rejection) -> Self {
        Self {
            accepted: false,
            reason: rejection.to_string(),
        }
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::accept(),
            Err(rejection) => Self::reject(&rejection),
        }
    }
}

/// Decide whether a sanitized candidate may be executed verbatim.
///
/// Checks run in a fixed order and stop at the first failure:
/// empty, leading `SELECT`, deny-list, stacked statements, leftover
/// comment markers, `SELECT ... INTO`.
pub fn validate(candidate: &str) -> Verdict {
    check(candidate).into()
}

/// Same checks as [`validate`], reporting the failing one as a [`Rejection`].
pub fn check(candidate: &str) -> Result<(), Rejection> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(Rejection::Empty);
    }

    let upper = trimmed.to_uppercase();

    if !STARTS_WITH_SELECT.is_match(&upper) {
        return Err(Rejection::NotSelect);
    }

    if let Some((kw, _)) = DENIED.iter().find(|(_, re)| re.is_match(&upper)) {
        return Err(Rejection::Keyword(*kw));
    }

    // one trailing terminator is fine, anything else means stacked statements
    let body = upper.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    if body.contains(';') {
        return Err(Rejection::MultipleStatements);
    }

    // the extractor strips these, but callers may skip it
    if candidate.contains("--") || candidate.contains("/*") {
        return Err(Rejection::Comment);
    }

    if INTO.is_match(&upper) {
        return Err(Rejection::SelectInto);
    }

    Ok(())
}

/// Extract then validate raw model output, the way every caller should.
///
/// Returns the sanitized query ready to run, or [`Error::Unsafe`] carrying
/// the rejection reason.
pub fn guard(raw: &str) -> Result<String, Error> {
    let sql = sanitize::extract(raw);
    debug!(%sql, "sanitized model output");

    match check(&sql) {
        Ok(()) => {
            debug!("query passed safety checks");
            Ok(sql)
        }
        Err(rejection) => {
            warn!(%rejection, %sql, "unsafe sql rejected");
            Err(Error::Unsafe(rejection.to_string()))
        }
    }
}

/// Result-size gate applied after execution. Hitting the ceiling exactly is fine.
pub fn check_row_limit(row_count: usize, max_rows: usize) -> Result<(), Error> {
    if row_count > max_rows {
        return Err(Error::TooManyRows {
            count: row_count,
            max: max_rows,
        });
    }
    Ok(())
}
