// src/compiler/builder.rs
//! SELECT statement builder - assemble query templates with a fluent API.
//!
//! The builder collects clauses as rendered fragments and emits the final
//! template once, so injectors never splice text into an existing string.
//! A `WHERE` clause appears only when at least one predicate was added.

// =============================================================================
// Join Kind
// =============================================================================

/// Join flavor used by a joined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

// =============================================================================
// Select Builder
// =============================================================================

/// Accumulates the clauses of one SELECT statement.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectBuilder {
    select: Vec<String>,
    from_table: String,
    from_alias: String,
    joins: Vec<String>,
    predicates: Vec<String>,
    group_by: Vec<String>,
    having: Option<String>,
    order_by: Option<String>,
    limit: Option<u32>,
}

impl SelectBuilder {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            from_table: table.to_string(),
            from_alias: alias.to_string(),
            ..Self::default()
        }
    }

    /// Add one expression to the SELECT list.
    pub fn select(mut self, expr: impl Into<String>) -> Self {
        self.select.push(expr.into());
        self
    }

    /// Add every expression in order.
    pub fn select_all<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Join another table on a raw condition.
    pub fn join(mut self, kind: JoinKind, table: &str, alias: &str, on: &str) -> Self {
        self.joins
            .push(format!("{} {} {} ON {}", kind.as_sql(), table, alias, on));
        self
    }

    pub fn inner_join(self, table: &str, alias: &str, on: &str) -> Self {
        self.join(JoinKind::Inner, table, alias, on)
    }

    pub fn left_join(self, table: &str, alias: &str, on: &str) -> Self {
        self.join(JoinKind::Left, table, alias, on)
    }

    /// Add a predicate; all predicates are AND-combined.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    pub fn having(mut self, predicate: impl Into<String>) -> Self {
        self.having = Some(predicate.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Alias of the primary table.
    pub fn primary_alias(&self) -> &str {
        &self.from_alias
    }

    /// True when the column list is still empty.
    pub fn has_no_columns(&self) -> bool {
        self.select.is_empty()
    }

    /// True when `alias` is the primary alias or one already joined.
    pub fn references_alias(&self, alias: &str) -> bool {
        if self.from_alias == alias {
            return true;
        }
        let tag = format!(" {alias} ON ");
        self.joins.iter().any(|j| j.contains(&tag))
    }

    /// Emit the final template.
    ///
    /// An empty SELECT list falls back to `{alias}.*`.
    pub fn into_template(self) -> String {
        let columns = if self.select.is_empty() {
            vec![format!("{}.*", self.from_alias)]
        } else {
            self.select
        };

        let mut sql = String::from("SELECT\n    ");
        sql.push_str(&columns.join(",\n    "));
        sql.push_str(&format!("\nFROM {} {}", self.from_table, self.from_alias));
        for join in &self.joins {
            sql.push('\n');
            sql.push_str(join);
        }
        if !self.predicates.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&self.predicates.join("\n  AND "));
        }
        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some(having) = &self.having {
            sql.push_str("\nHAVING ");
            sql.push_str(having);
        }
        if let Some(order) = &self.order_by {
            sql.push_str("\nORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {limit}"));
        }
        sql
    }
}
