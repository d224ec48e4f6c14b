//! Record Models
//!
//! One module per table. Each model implements [`DatabaseResource`] and
//! exposes its operations as associated functions taking any
//! [`QueryExecutor`], so a single scoped connection can serve a whole
//! operation. The generic helpers below cover what the three tables share.

use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::database::{
    error::DatabaseError,
    filters::{Filters, Page},
    traits::DatabaseResource,
    values::DatabaseValue,
};
use crate::database::connector::QueryExecutor;

pub mod feedback;
pub mod session;
pub mod user_interaction;

/// A page of records plus the number of rows matching the same filters.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total_count: i32,
}

fn decode_one<T: DatabaseResource>(row: Option<PgRow>) -> Result<Option<T>, DatabaseError> {
    match row {
        Some(row) => Ok(Some(T::from_row(&row)?)),
        None => Ok(None),
    }
}

fn decode_all<T: DatabaseResource>(rows: Vec<PgRow>) -> Result<Vec<T>, DatabaseError> {
    rows.iter()
        .map(|row| T::from_row(row).map_err(DatabaseError::from))
        .collect()
}

/// COUNT results come back as BIGINT.
fn narrow_count(count: i64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

pub async fn find_by_id<T, E>(conn: &mut E, id: Uuid) -> Result<Option<T>, DatabaseError>
where
    T: DatabaseResource,
    E: QueryExecutor,
{
    let query = format!("{} WHERE id = $1", T::select_sql());
    decode_one(conn.fetch_row(&query, vec![id.into()]).await?)
}

/// Inserts one row and returns it. `columns` and `params` line up one to one.
pub async fn insert<T, E>(
    conn: &mut E,
    columns: &[&str],
    params: Vec<DatabaseValue>,
) -> Result<T, DatabaseError>
where
    T: DatabaseResource,
    E: QueryExecutor,
{
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    let query = format!(
        "INSERT INTO {} ({}) VALUES ({}){}",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", "),
        T::returning_sql()
    );
    decode_one(conn.fetch_row(&query, params).await?)?.ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
}

/// `UPDATE <table> SET col = COALESCE($n, col), ... WHERE id = $1`. Absent
/// values keep the stored ones. Bumps `updated_at` on tables that have it.
pub fn partial_update_sql<T: DatabaseResource>(columns: &[&str]) -> String {
    let mut assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = COALESCE(${}, {})", column, i + 2, column))
        .collect();
    if T::is_updatable() {
        assignments.push("updated_at = NOW()".to_string());
    }
    format!(
        "UPDATE {} SET {} WHERE id = $1{}",
        T::TABLE,
        assignments.join(", "),
        T::returning_sql()
    )
}

/// Returns whether a row was removed.
pub async fn delete_by_id<T, E>(conn: &mut E, id: Uuid) -> Result<bool, DatabaseError>
where
    T: DatabaseResource,
    E: QueryExecutor,
{
    let query = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
    Ok(conn.execute(&query, vec![id.into()]).await? > 0)
}

pub async fn count<T, E>(conn: &mut E, filters: &Filters) -> Result<i32, DatabaseError>
where
    T: DatabaseResource,
    E: QueryExecutor,
{
    let query = format!("SELECT COUNT(*) FROM {}{}", T::TABLE, filters.where_sql());
    let total = conn.fetch_value::<i64>(&query, filters.params()).await?;
    Ok(narrow_count(total.unwrap_or(0)))
}

/// One page of rows matching `filters` together with the total match count.
pub async fn list<T, E>(
    conn: &mut E,
    filters: Filters,
    order_by: &str,
    page: Page,
) -> Result<Listing<T>, DatabaseError>
where
    T: DatabaseResource,
    E: QueryExecutor,
{
    let (tail, params) = filters.page_sql(order_by, page);
    let query = format!("{}{}", T::select_sql(), tail);
    let items = decode_all(conn.fetch_all(&query, params).await?)?;
    let total_count = count::<T, E>(conn, &filters).await?;
    Ok(Listing { items, total_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{feedback::Feedback, user_interaction::UserInteraction};

    #[test]
    fn test_partial_update_sql_bumps_updated_at() {
        assert_eq!(
            partial_update_sql::<Feedback>(&["feedback", "startup_name"]),
            format!(
                "UPDATE feedback SET feedback = COALESCE($2, feedback), \
                 startup_name = COALESCE($3, startup_name), updated_at = NOW() \
                 WHERE id = $1 RETURNING {}",
                Feedback::COLUMNS
            )
        );
    }

    #[test]
    fn test_partial_update_sql_without_updated_at() {
        let sql = partial_update_sql::<UserInteraction>(&["url"]);
        assert!(sql.starts_with("UPDATE user_interactions SET url = COALESCE($2, url) WHERE id = $1"));
        assert!(!sql.contains("updated_at"));
    }

    #[test]
    fn test_narrow_count_saturates() {
        assert_eq!(narrow_count(42), 42);
        assert_eq!(narrow_count(i64::MAX), i32::MAX);
    }
}
