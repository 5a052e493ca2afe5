// src/sql.rs
//! Statement validation for rendered SQL.
//!
//! Rendered queries are re-parsed before execution; anything that is not
//! exactly one SELECT statement is rejected. This backstops the renderer:
//! even a template bug cannot smuggle a mutation to the endpoint.

use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("SQL does not parse: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),
    #[error("expected one statement, found {0}")]
    StatementCount(usize),
    #[error("only SELECT statements may execute, found {kind}")]
    NotSelect { kind: String },
}

/// Parse `sql` and confirm it is a single SELECT statement.
pub fn ensure_select(sql: &str) -> Result<(), SqlError> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(SqlError::StatementCount(statements.len()));
    }
    match &statements[0] {
        Statement::Query(_) => Ok(()),
        other => Err(SqlError::NotSelect {
            kind: leading_keyword(other),
        }),
    }
}

/// First keyword of the statement, for error messages.
fn leading_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_uppercase()
}
