//! Pull query options and SQL text sanitizing.

use crate::constants::KSQL_QUERY_PULL_TABLE_SCAN_ENABLED;
use std::collections::HashMap;

/// Options for a single query: the SQL text plus server properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub sql: String,
    /// Server properties sent with the query, e.g. [`KSQL_QUERY_PULL_TABLE_SCAN_ENABLED`]
    pub properties: HashMap<String, String>,
}

impl QueryOptions {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            properties: HashMap::new(),
        }
    }

    /// True when the SQL text is empty or whitespace only.
    pub fn empty_query(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Normalize whitespace in the SQL text in place. See [`sanitize_sql`].
    pub fn sanitize_query(&mut self) {
        self.sql = sanitize_sql(&self.sql);
    }

    /// Allow or forbid pull queries that scan the whole table.
    pub fn enable_pull_query_table_scan(&mut self, enabled: bool) {
        self.set_property(KSQL_QUERY_PULL_TABLE_SCAN_ENABLED, enabled.to_string());
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Builder form of [`QueryOptions::set_property`].
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }
}

/// Collapse whitespace runs to a single space and trim the ends.
///
/// Text inside `'...'`, `"..."`, `` `...` `` and `/* ... */` is copied untouched.
/// `--` line comments are dropped since joining lines would otherwise swallow the
/// rest of the statement. Applying it twice gives the same result as applying it
/// once.
pub fn sanitize_sql(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut in_block_comment = false;
    let mut pending_space = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        if in_block_comment {
            out.push(c);
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                out.push('/');
                in_block_comment = false;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if c == '-' && chars.peek() == Some(&'-') {
            for skipped in chars.by_ref() {
                if skipped == '\n' {
                    break;
                }
            }
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            out.push_str("/*");
            in_block_comment = true;
            continue;
        }

        if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        }
        out.push(c);
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}
