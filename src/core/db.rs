// database connection and query execution
// supports postgres, sqlite, and mysql
// only ever runs sql that already passed the safety gate

use crate::Error;
use crate::core::safety;
use serde::Serialize;
use sqlx::{AnyPool, Column, Row, any::AnyPoolOptions};
use tracing::{debug, info, warn};

pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
    max_rows: usize,
}

#[derive(Serialize, Debug)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
    Mysql,
}

impl Dialect {
    // figure out which database we're talking to from the url
    pub fn detect(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Self::Postgres
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Self::Mysql
        } else {
            Self::Sqlite
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
        }
    }
}

impl Db {
    pub async fn connect(url: &str, max_rows: usize) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();

        let dialect = Dialect::detect(url);

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        info!(dialect = dialect.name(), max_rows, "database connected");
        Ok(Self {
            pool,
            dialect,
            max_rows,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    // cheap liveness probe for /health
    pub async fn ping(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database ping failed");
                false
            }
        }
    }

    // table and column info so the model knows what to query
    pub async fn schema(&self) -> Result<String, Error> {
        Ok(format_schema(self.columns().await?))
    }

    /// Schema text prefixed with the dialect, as handed to the model.
    pub fn prompt_context(&self, schema: &str) -> String {
        format!("DIALECT {}\n\n{schema}", self.dialect.name())
    }

    pub async fn tables(&self) -> Result<Vec<String>, Error> {
        let mut tables: Vec<String> = Vec::new();
        for (table, _, _) in self.columns().await? {
            if tables.last() != Some(&table) {
                tables.push(table);
            }
        }
        Ok(tables)
    }

    async fn columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        match self.dialect {
            Dialect::Postgres => self.postgres_columns().await,
            Dialect::Sqlite => self.sqlite_columns().await,
            Dialect::Mysql => self.mysql_columns().await,
        }
    }

    async fn postgres_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"SELECT table_name::text, column_name::text, data_type::text
               FROM information_schema.columns
               WHERE table_schema = 'public'
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn sqlite_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for (table,) in tables {
            let query = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
            let cols: Vec<(i32, String, String, i32, Option<String>, i32)> =
                sqlx::query_as(&query).fetch_all(&self.pool).await?;

            for (_, name, dtype, _, _, _) in cols {
                result.push((table.clone(), name, dtype));
            }
        }

        Ok(result)
    }

    async fn mysql_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"SELECT table_name, column_name, data_type
               FROM information_schema.columns
               WHERE table_schema = DATABASE()
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Run a validated query and return rows as json values.
    ///
    /// Fails with [`Error::TooManyRows`] when the result exceeds the
    /// configured ceiling.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, Error> {
        debug!(%sql, "executing query");
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        safety::check_row_limit(rows.len(), self.max_rows)?;

        let Some(first) = rows.first() else {
            return Ok(QueryResult {
                columns: vec![],
                rows: vec![],
                row_count: 0,
            });
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let json_rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| row_value_to_json(row, i))
                    .collect()
            })
            .collect();

        let row_count = json_rows.len();
        info!(row_count, columns = columns.len(), "query returned");

        Ok(QueryResult {
            columns,
            rows: json_rows,
            row_count,
        })
    }
}

// turn schema rows into readable text for the model
pub fn format_schema(rows: Vec<(String, String, String)>) -> String {
    let mut result = String::new();
    let mut current_table = String::new();

    for (table, column, dtype) in rows {
        if table != current_table {
            if !current_table.is_empty() {
                result.push_str(")\n\n");
            }
            result.push_str(&format!("TABLE {table} (\n"));
            current_table = table;
        }
        result.push_str(&format!("  {column} {dtype}\n"));
    }

    if !current_table.is_empty() {
        result.push(')');
    }

    result
}

// convert database values to json (handling type mismatches gracefully)
fn row_value_to_json(row: &sqlx::any::AnyRow, index: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return serde_json::Value::Null;
    }

    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return serde_json::Value::Bool(v);
    }

    // some types just don't make it through the any driver
    serde_json::Value::String("<unsupported>".to_string())
}
