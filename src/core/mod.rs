// core logic - ai, database, and the sql safety gate

mod ai;
mod db;
pub mod safety;
pub mod sanitize;

pub use ai::{Ai, Claude, Gemini, Ollama, OpenAi, SqlGenerator, system_prompt};
pub use db::{Db, Dialect, QueryResult, format_schema};
pub use safety::{Rejection, Verdict, check_row_limit, guard, validate};
pub use sanitize::{extract, strip_comments};
