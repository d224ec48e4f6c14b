//! Connectors and Query Executors
//!
//! A [`Connector`] opens and closes single connections; the acquisition layer
//! decides whether those connections are pooled or dedicated to one request.
//! [`PgConnector`] is the production implementation on top of `sqlx`. Tests
//! swap in a counting fake so acquisition policy can be checked without a
//! server.
//!
//! Every connection a connector hands out is a [`QueryExecutor`]: the four
//! operations the record layer needs, each taking `DatabaseValue` parameters.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, Decode, PgConnection, Postgres, Row, Type};
use tokio::time::timeout;

use crate::database::{connection::ConnectionConfig, error::DatabaseError, values::DatabaseValue};

#[async_trait]
pub trait QueryExecutor: Send {
    /// Runs a statement and returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: Vec<DatabaseValue>) -> Result<u64, DatabaseError>;

    /// Returns the first row, if any.
    async fn fetch_row(
        &mut self,
        sql: &str,
        params: Vec<DatabaseValue>,
    ) -> Result<Option<PgRow>, DatabaseError>;

    async fn fetch_all(&mut self, sql: &str, params: Vec<DatabaseValue>) -> Result<Vec<PgRow>, DatabaseError>;

    /// Returns the first column of the first row, if any.
    async fn fetch_value<T>(&mut self, sql: &str, params: Vec<DatabaseValue>) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send,
    {
        match self.fetch_row(sql, params).await? {
            Some(row) => Ok(Some(row.try_get::<T, _>(0)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: QueryExecutor + Send + 'static;

    /// Opens one connection. The caller bounds this with the connect timeout.
    async fn connect(
        &self,
        config: &ConnectionConfig,
        command_timeout: Duration,
    ) -> Result<Self::Connection, sqlx::Error>;

    /// Closes a connection gracefully.
    async fn close(&self, connection: Self::Connection) -> Result<(), sqlx::Error>;

    /// Cheap liveness check used before a pooled connection is handed out.
    async fn ping(&self, connection: &mut Self::Connection) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgHandle;

    async fn connect(
        &self,
        config: &ConnectionConfig,
        command_timeout: Duration,
    ) -> Result<PgHandle, sqlx::Error> {
        let connection = PgConnection::connect_with(&config.connect_options()).await?;
        Ok(PgHandle {
            connection,
            command_timeout,
        })
    }

    async fn close(&self, handle: PgHandle) -> Result<(), sqlx::Error> {
        handle.connection.close().await
    }

    async fn ping(&self, handle: &mut PgHandle) -> Result<(), sqlx::Error> {
        handle.connection.ping().await
    }
}

/// A live PostgreSQL connection with a per-command timeout.
pub struct PgHandle {
    connection: PgConnection,
    command_timeout: Duration,
}

fn bind_all(sql: &str, params: Vec<DatabaseValue>) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for value in params {
        query = query.bind(value);
    }
    query
}

#[async_trait]
impl QueryExecutor for PgHandle {
    async fn execute(&mut self, sql: &str, params: Vec<DatabaseValue>) -> Result<u64, DatabaseError> {
        let query = bind_all(sql, params);
        let result = timeout(self.command_timeout, query.execute(&mut self.connection))
            .await
            .map_err(|_| DatabaseError::CommandTimeout(self.command_timeout))??;
        Ok(result.rows_affected())
    }

    async fn fetch_row(
        &mut self,
        sql: &str,
        params: Vec<DatabaseValue>,
    ) -> Result<Option<PgRow>, DatabaseError> {
        let query = bind_all(sql, params);
        let row = timeout(self.command_timeout, query.fetch_optional(&mut self.connection))
            .await
            .map_err(|_| DatabaseError::CommandTimeout(self.command_timeout))??;
        Ok(row)
    }

    async fn fetch_all(&mut self, sql: &str, params: Vec<DatabaseValue>) -> Result<Vec<PgRow>, DatabaseError> {
        let query = bind_all(sql, params);
        let rows = timeout(self.command_timeout, query.fetch_all(&mut self.connection))
            .await
            .map_err(|_| DatabaseError::CommandTimeout(self.command_timeout))??;
        Ok(rows)
    }
}
