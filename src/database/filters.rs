//! Filter Building
//!
//! Builds `WHERE` clauses with numbered placeholders from optional filter
//! values, and the `ORDER BY`/`LIMIT`/`OFFSET` tail for list queries. Absent
//! filters are skipped so a single builder serves every combination a list
//! query accepts.

use crate::database::values::DatabaseValue;

pub const DEFAULT_LIMIT: i32 = 10;
pub const MAX_LIMIT: i32 = 100;

#[derive(Debug, Clone, Default)]
pub struct Filters {
    clauses: Vec<String>,
    params: Vec<DatabaseValue>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = $n` when `value` is present.
    pub fn eq<V: Into<DatabaseValue>>(self, column: &str, value: Option<V>) -> Self {
        self.push(column, "=", value.map(Into::into))
    }

    /// Adds a case-insensitive substring match when `value` is present.
    /// `%`, `_` and `\` in the value match literally.
    pub fn contains(mut self, column: &str, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.params.push(format!("%{}%", escape_like(&value)).into());
            self.clauses
                .push(format!("{} ILIKE ${} ESCAPE '\\'", column, self.params.len()));
        }
        self
    }

    fn push(mut self, column: &str, operator: &str, value: Option<DatabaseValue>) -> Self {
        if let Some(value) = value.filter(|value| !value.is_null()) {
            self.params.push(value);
            self.clauses
                .push(format!("{} {} ${}", column, operator, self.params.len()));
        }
        self
    }

    /// ` WHERE a = $1 AND b = $2`, or an empty string with no filters.
    pub fn where_sql(&self) -> String {
        let mut query = String::new();
        if !self.clauses.is_empty() {
            query.push_str(" WHERE ");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            query.push_str(clause);
            if i < self.clauses.len() - 1 {
                query.push_str(" AND ");
            }
        }
        query
    }

    pub fn params(&self) -> Vec<DatabaseValue> {
        self.params.clone()
    }

    /// The filter clause followed by ordering and pagination, with the limit
    /// and offset bound as the next two placeholders.
    pub fn page_sql(&self, order_by: &str, page: Page) -> (String, Vec<DatabaseValue>) {
        let mut params = self.params();
        let limit_placeholder = params.len() + 1;
        let offset_placeholder = params.len() + 2;
        params.push(i64::from(page.limit).into());
        params.push(i64::from(page.offset).into());
        let query = format!(
            "{} ORDER BY {} LIMIT ${} OFFSET ${}",
            self.where_sql(),
            order_by,
            limit_placeholder,
            offset_placeholder
        );
        (query, params)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i32,
    pub offset: i32,
}

impl Page {
    /// Clamps the limit to `1..=MAX_LIMIT` and the offset to non-negative.
    pub fn new(limit: Option<i32>, offset: Option<i32>) -> Self {
        Page {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}
