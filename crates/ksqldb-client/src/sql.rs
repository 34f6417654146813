//! Local SQL syntax check run before pull queries when enabled.

use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::fmt;

/// A single syntax problem found in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSyntaxError {
    pub message: String,
}

impl SqlSyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SqlSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks a statement and reports every syntax error found.
///
/// An empty result means the statement passed.
pub trait SqlValidator: Send + Sync {
    fn validate(&self, sql: &str) -> Vec<SqlSyntaxError>;
}

/// Default validator built on `sqlparser`.
///
/// ksqlDB requires each statement to be terminated with `;`, so a missing
/// terminator is reported on top of whatever the parser rejects. A `;` inside
/// a comment does not count.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParserValidator;

impl SqlValidator for SqlParserValidator {
    fn validate(&self, sql: &str) -> Vec<SqlSyntaxError> {
        let statement = sql.trim();
        let mut errors = Vec::new();

        if !is_terminated(statement) {
            errors.push(SqlSyntaxError::new(
                "statement must be terminated with ';'",
            ));
        }

        if let Err(e) = Parser::parse_sql(&GenericDialect {}, statement) {
            errors.push(SqlSyntaxError::new(e.to_string()));
        }

        errors
    }
}

/// True when the last token outside comments and whitespace is `;`.
fn is_terminated(statement: &str) -> bool {
    let Ok(tokens) = Tokenizer::new(&GenericDialect {}, statement).tokenize() else {
        return false;
    };
    tokens
        .iter()
        .rev()
        .find(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .is_some_and(|t| *t == Token::SemiColon)
}
