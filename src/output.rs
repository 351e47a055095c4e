// output formatting - pretty tables or raw json

use crate::Error;
use crate::core::{QueryResult, Verdict};

const MAX_WIDTH: usize = 40;

pub struct Output;

impl Output {
    // nice table format for humans
    pub fn pretty(sql: &str, result: &QueryResult) {
        println!("sql: {sql}\n");
        println!("rows: {}\n", result.row_count);

        if result.rows.is_empty() {
            println!("no results");
            return;
        }

        print!("{}", render_table(result));
    }

    // raw json for scripts
    pub fn raw(result: &QueryResult) -> Result<(), Error> {
        println!("{}", serde_json::to_string(result)?);
        Ok(())
    }

    // what `check` shows: the cleaned query and whether it would run
    pub fn verdict(sql: &str, verdict: &Verdict) {
        println!("sql: {sql}\n");
        if verdict.accepted {
            println!("verdict: accepted");
        } else {
            println!("verdict: rejected ({})", verdict.reason);
        }
    }
}

fn render_table(result: &QueryResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| clip(&format_value(v))).collect())
        .collect();

    // figure out column widths, capped so things don't get crazy
    let mut widths: Vec<usize> = result
        .columns
        .iter()
        .map(|c| c.chars().count().min(MAX_WIDTH))
        .collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| format!("{:w$}", clip(c)))
        .collect();
    out.push_str(&header.join(" | "));
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for row in &cells {
        let formatted: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(s, &w)| format!("{s:w$}"))
            .collect();
        out.push_str(&formatted.join(" | "));
        out.push('\n');
    }

    out
}

fn clip(s: &str) -> String {
    if s.chars().count() > MAX_WIDTH {
        let head: String = s.chars().take(MAX_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn format_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_pads_columns() {
        let result = QueryResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![json!(1), json!("ada")], vec![json!(22), json!(null)]],
            row_count: 2,
        };

        assert_eq!(
            render_table(&result),
            "id | name\n---+-----\n1  | ada \n22 | null\n"
        );
    }

    #[test]
    fn long_values_are_clipped() {
        let long = "x".repeat(60);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MAX_WIDTH);
        assert!(clipped.ends_with("..."));
    }
}
