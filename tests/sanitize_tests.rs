// tests for pulling sql out of model replies

use sqlgate::core::strip_comments;
use sqlgate::{extract, validate};

#[test]
fn test_clean_sql_unchanged() {
    assert_eq!(extract("SELECT * FROM Users"), "SELECT * FROM Users");
}

#[test]
fn test_code_fences_removed() {
    let cases = [
        ("```sql\nSELECT 1\n```", "SELECT 1"),
        ("```sql\nSELECT * FROM Users\n```", "SELECT * FROM Users"),
        ("```\nSELECT * FROM Users\n```", "SELECT * FROM Users"),
        ("```sql\nSELECT * FROM Users", "SELECT * FROM Users"),
        ("SELECT * FROM Users\n```", "SELECT * FROM Users"),
        ("```postgresql\nSELECT * FROM Users\n```", "SELECT * FROM Users"),
        ("```SELECT * FROM Users```", "SELECT * FROM Users"),
    ];

    for (input, expected) in cases {
        assert_eq!(extract(input), expected, "input: {input:?}");
    }
}

#[test]
fn test_whitespace_trimmed() {
    for input in [
        "   SELECT * FROM Users   ",
        "\n\nSELECT * FROM Users\n\n",
        "\t\tSELECT * FROM Users\t\t",
    ] {
        assert_eq!(extract(input), "SELECT * FROM Users");
    }
}

#[test]
fn test_preamble_dropped() {
    let input = "
        Here is the SQL query you requested:

        SELECT * FROM Users WHERE UserID = 1
        ";

    assert_eq!(extract(input), "SELECT * FROM Users WHERE UserID = 1");
}

#[test]
fn test_preamble_inside_fence() {
    let input = "Sure! Here you go:\n```sql\nselect name\nfrom users\n```";
    assert_eq!(extract(input), "select name\nfrom users");
}

#[test]
fn test_no_select_left_for_validator() {
    let out = extract("I'm sorry, I can't write that query.");
    assert_eq!(out, "I'm sorry, I can't write that query.");
    assert!(!validate(&out).accepted);
}

#[test]
fn test_line_comment_removed() {
    let out = extract("SELECT * FROM Users -- all users");
    assert!(!out.contains("--"));
    assert!(out.contains("SELECT * FROM Users"));
    assert!(validate(&out).accepted);
}

#[test]
fn test_block_comment_removed() {
    let out = extract("SELECT * FROM Users /* get all users */ WHERE Active = 1");
    assert_eq!(out, "SELECT * FROM Users  WHERE Active = 1");
}

#[test]
fn test_comments_in_multiline_query() {
    let input = "SELECT
    UserID, -- user identifier
    Username -- user name
FROM Users";

    assert_eq!(extract(input), "SELECT\n    UserID,\n    Username\nFROM Users");
}

#[test]
fn test_strip_single_line_comments() {
    let out = strip_comments("SELECT * FROM Users -- this is a comment");
    assert_eq!(out, "SELECT * FROM Users");
}

#[test]
fn test_comment_only_lines_dropped() {
    let out = strip_comments("-- heading\nSELECT 1\n   -- trailing note\nFROM t");
    assert_eq!(out, "SELECT 1\nFROM t");
}

#[test]
fn test_strip_multiline_block_comment() {
    let sql = "SELECT * FROM Users
        /* this is a
           multi-line comment */
        WHERE Active = 1";

    let out = strip_comments(sql);
    assert!(!out.contains("/*"));
    assert!(!out.contains("*/"));
    assert!(out.contains("WHERE Active = 1"));
}

#[test]
fn test_block_comments_are_not_greedy() {
    let out = strip_comments("SELECT a /* x */, b /* y */ FROM t");
    assert_eq!(out, "SELECT a , b  FROM t");
}

#[test]
fn test_unterminated_block_comment_left_for_validator() {
    let out = extract("SELECT * FROM Users /* DROP TABLE Users");
    assert!(out.contains("/*"));
    assert!(!validate(&out).accepted);
}

#[test]
fn test_string_literals_are_not_protected() {
    // lexical stripping only, quotes are not tracked
    let out = strip_comments("SELECT * FROM Notes WHERE Body = 'see --note'");
    assert_eq!(out, "SELECT * FROM Notes WHERE Body = 'see");
}

#[test]
fn test_comment_hidden_statement_is_neutralised() {
    let out = extract("SELECT 1 -- ; DROP TABLE Users");
    assert_eq!(out, "SELECT 1");
    assert!(validate(&out).accepted);
}
