//! Read-only statement guard
//! Conservative regex check: a statement passes only when it is a single
//! query that starts with a reading keyword and mentions no writing keyword.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--[^\n]*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").unwrap());

static READ_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\(*\s*(SELECT|WITH|SHOW|EXPLAIN|VALUES|TABLE)\b").unwrap()
});

static WRITE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(INSERT|UPDATE|DELETE|MERGE|UPSERT|DROP|ALTER|CREATE|TRUNCATE|GRANT|REVOKE|COPY|CALL|DO|VACUUM|REINDEX|CLUSTER|LOCK|COMMENT|SECURITY|REFRESH|SET|RESET|INTO)\b",
    )
    .unwrap()
});

pub fn is_read_only(sql: &str) -> bool {
    let stripped = BLOCK_COMMENT.replace_all(sql, " ");
    let stripped = LINE_COMMENT.replace_all(&stripped, " ");
    let stripped = STRING_LITERAL.replace_all(&stripped, "''");

    // A trailing semicolon is fine, a second statement is not.
    let body = stripped.trim().trim_end_matches(';');
    if body.contains(';') {
        debug!("Rejected multi-statement SQL");
        return false;
    }

    READ_PREFIX.is_match(body) && !WRITE_KEYWORD.is_match(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reads() {
        assert!(is_read_only("SELECT * FROM users"));
        assert!(is_read_only("  select id from users where id = 1;"));
        assert!(is_read_only("WITH t AS (SELECT 1) SELECT * FROM t"));
        assert!(is_read_only("EXPLAIN SELECT 1"));
        assert!(is_read_only("SHOW search_path"));
        assert!(is_read_only("(SELECT 1) UNION (SELECT 2)"));
    }

    #[test]
    fn test_writes_rejected() {
        assert!(!is_read_only("DELETE FROM users"));
        assert!(!is_read_only("update users set name = 'x'"));
        assert!(!is_read_only("DROP TABLE users"));
        assert!(!is_read_only("SELECT * INTO backup FROM users"));
        assert!(!is_read_only("WITH d AS (DELETE FROM users RETURNING *) SELECT * FROM d"));
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert!(!is_read_only("SELECT 1; DROP TABLE users"));
        assert!(!is_read_only("SELECT 1; SELECT 2"));
    }

    #[test]
    fn test_keywords_in_comments_and_literals_ignored() {
        assert!(is_read_only("SELECT 1 -- delete later"));
        assert!(is_read_only("/* drop */ SELECT 1"));
        assert!(is_read_only("SELECT * FROM logs WHERE msg = 'update; delete'"));
    }

    #[test]
    fn test_comment_cannot_hide_prefix() {
        assert!(!is_read_only("-- SELECT\nDELETE FROM users"));
    }

    #[test]
    fn test_empty_is_not_read_only() {
        assert!(!is_read_only(""));
        assert!(!is_read_only("   ;"));
    }
}
