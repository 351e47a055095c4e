// pulls the actual query out of whatever the model sent back
// models wrap sql in markdown, add a chatty preamble, leave comments around

use regex::Regex;
use std::sync::LazyLock;

const FENCE: &str = "```";

// shortest match from each /* to the next */, across lines
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern"));

/// Reduce raw model output to a single candidate statement.
///
/// Never fails. Text without a line starting with `SELECT` comes back only
/// trimmed and de-fenced, and the validator rejects it later.
pub fn extract(raw: &str) -> String {
    let text = raw.trim();
    let text = strip_leading_fence(text);
    let text = text.strip_suffix(FENCE).unwrap_or(text);
    let text = skip_preamble(text.trim());

    strip_comments(text).trim().to_string()
}

/// Remove `--` line comments and `/* */` block comments.
///
/// This is lexical only: quotes are not tracked, so a `--` or `/*` inside a
/// string literal still starts a comment. Unterminated block comments are
/// left in place.
pub fn strip_comments(text: &str) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        })
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_end)
        .collect();

    BLOCK_COMMENT.replace_all(&lines.join("\n"), "").into_owned()
}

// drop the opening fence and its language tag (```sql, ```tsql, ...)
// a fence line that carries query text keeps the text
fn strip_leading_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    let (first_line, tail) = match rest.find('\n') {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };

    let tag = first_line.trim();
    let is_tag = !tag.contains(char::is_whitespace) && !tag.to_uppercase().starts_with("SELECT");

    if is_tag { tail } else { rest }
}

// "Here is your query:" and friends
fn skip_preamble(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| line.to_uppercase().starts_with("SELECT"))
        .and_then(|line| text.find(line))
        .map_or(text, |start| &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_tag_is_dropped() {
        assert_eq!(strip_leading_fence("```sql\nSELECT 1"), "\nSELECT 1");
        assert_eq!(strip_leading_fence("```\nSELECT 1"), "\nSELECT 1");
        assert_eq!(strip_leading_fence("```sql"), "");
    }

    #[test]
    fn fence_line_with_query_text_is_kept() {
        assert_eq!(strip_leading_fence("```SELECT 1```"), "SELECT 1```");
        assert_eq!(strip_leading_fence("```SELECT\n* FROM t"), "SELECT\n* FROM t");
    }

    #[test]
    fn preamble_skips_to_first_select_line() {
        let text = "Sure, here you go:\n  select id FROM t";
        assert_eq!(skip_preamble(text), "select id FROM t");
    }

    #[test]
    fn no_select_line_leaves_text_alone() {
        let text = "I cannot help with that.";
        assert_eq!(skip_preamble(text), text);
    }
}
