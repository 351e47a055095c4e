// sqlgate library - natural language to read-only sql

pub mod cli;
pub mod config;
pub mod core;
mod error;
pub mod logging;
mod output;
mod server;

pub use config::{AiConfig, Provider};
pub use crate::core::{Ai, Db, QueryResult, SqlGenerator, Verdict, extract, guard, validate};
pub use error::Error;
pub use server::{AppState, Server};
