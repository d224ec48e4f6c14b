//! Database Resource Traits
//!
//! This module defines the `DatabaseResource` trait implemented by every record
//! kind stored in PostgreSQL. The trait names the table and the column list so
//! the query helpers can build `SELECT` and `RETURNING` clauses, and it converts
//! a fetched row back into the struct.

use sqlx::{Error, postgres::PgRow};

/// Trait that must be implemented by any struct read through the query helpers.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use crate::database::traits::DatabaseResource;
/// use sqlx::{postgres::PgRow, Error, Row};
///
/// pub struct Feedback {
///     pub id: Uuid,
///     pub feedback: String,
/// }
///
/// impl DatabaseResource for Feedback {
///     const TABLE: &'static str = "feedback";
///     const COLUMNS: &'static str = "id, feedback";
///
///     fn from_row(row: &PgRow) -> Result<Self, Error> {
///         Ok(Feedback {
///             id: row.try_get("id")?,
///             feedback: row.try_get("feedback")?,
///         })
///     }
/// }
/// ```
pub trait DatabaseResource: Sized {
    /// Table the resource lives in.
    const TABLE: &'static str;

    /// Comma separated column list, in the order `from_row` expects.
    const COLUMNS: &'static str;

    /// Converts a database row to the implementing struct.
    ///
    /// # Arguments
    ///
    /// * `row` - The database row containing the resource data
    ///
    /// # Returns
    ///
    /// `Result<Self, Error>` - The constructed struct or database error
    fn from_row(row: &PgRow) -> Result<Self, Error>;

    /// Whether the table carries an `updated_at` column to bump on writes.
    fn is_updatable() -> bool {
        true
    }

    /// `SELECT <columns> FROM <table>` without any clause.
    fn select_sql() -> String {
        format!("SELECT {} FROM {}", Self::COLUMNS, Self::TABLE)
    }

    /// `RETURNING <columns>` suffix for writes.
    fn returning_sql() -> String {
        format!(" RETURNING {}", Self::COLUMNS)
    }
}
