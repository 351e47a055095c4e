// command line interface

use crate::config::AiConfig;
use crate::core::{self, Ai, Db, safety::DEFAULT_MAX_ROWS};
use crate::output::Output;
use crate::server::{AppState, Server};
use crate::{Error, logging};
use clap::{Parser, Subcommand};
use miette::Result;
use std::io::Read;

#[derive(Parser)]
#[command(
    name = "sqlgate",
    version,
    about = "Ask your database questions in plain english, read-only"
)]
struct Cli {
    /// database connection url
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// refuse results with more rows than this
    #[arg(long, env = "MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS, global = true)]
    max_rows: usize,

    /// log level or tracing filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    ai: AiConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// start as http server
    Serve {
        /// port number
        #[arg(long, env = "APP_PORT", default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, env = "APP_HOST", default_value = "127.0.0.1")]
        host: String,
    },

    /// ask one question and print the result
    Ask {
        /// the question, in plain english
        prompt: String,

        /// print the generated sql without running it
        #[arg(long)]
        dry_run: bool,

        /// print json instead of a table
        #[arg(long)]
        raw: bool,
    },

    /// run the safety gate on some sql (argument or stdin), no database needed
    Check {
        /// raw model output or sql to check
        sql: Option<String>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match cli.command {
        Commands::Serve { port, host } => {
            let db = connect(cli.db, cli.max_rows).await?;
            let ai = Ai::new(&cli.ai)?;
            let state = AppState::load(db, ai).await?;
            Ok(Server::run(state, &host, port).await?)
        }

        Commands::Ask {
            prompt,
            dry_run,
            raw,
        } => {
            let db = connect(cli.db, cli.max_rows).await?;
            let ai = Ai::new(&cli.ai)?;

            let schema = db.schema().await?;
            let answer = ai.generate_sql(&prompt, &db.prompt_context(&schema)).await?;
            let sql = core::guard(&answer)?;

            if dry_run {
                println!("{sql}");
                return Ok(());
            }

            let result = db.execute(&sql).await?;
            if raw {
                Output::raw(&result)?;
            } else {
                Output::pretty(&sql, &result);
            }
            Ok(())
        }

        Commands::Check { sql } => {
            let input = match sql {
                Some(sql) => sql,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).map_err(Error::from)?;
                    buf
                }
            };

            let sql = core::extract(&input);
            let verdict = core::validate(&sql);
            Output::verdict(&sql, &verdict);

            if verdict.accepted {
                Ok(())
            } else {
                Err(Error::Unsafe(verdict.reason).into())
            }
        }
    }
}

async fn connect(url: Option<String>, max_rows: usize) -> Result<Db> {
    let url = url.ok_or_else(|| miette::miette!("database url required (--db or DATABASE_URL)"))?;
    Ok(Db::connect(&url, max_rows).await?)
}
