//! Test doubles for the connection layer.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;

use crate::database::{
    connection::ConnectionConfig,
    connector::{Connector, QueryExecutor},
    error::DatabaseError,
    values::DatabaseValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Connect,
    Fail(&'static str),
    Hang,
}

/// Counts opens and closes, and remembers which tables exist so DDL that is
/// not idempotent fails the second time, the way a real server would.
pub struct CountingConnector {
    behaviour: Mutex<Behaviour>,
    next_id: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    abandoned: Arc<AtomicUsize>,
    tables: Arc<Mutex<HashSet<String>>>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl Default for CountingConnector {
    fn default() -> Self {
        CountingConnector::with_behaviour(Behaviour::Connect)
    }
}

impl CountingConnector {
    fn with_behaviour(behaviour: Behaviour) -> Self {
        CountingConnector {
            behaviour: Mutex::new(behaviour),
            next_id: AtomicUsize::new(1),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            abandoned: Arc::new(AtomicUsize::new(0)),
            tables: Arc::new(Mutex::new(HashSet::new())),
            statements: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every connect attempt fails with `reason`.
    pub fn failing(reason: &'static str) -> Self {
        CountingConnector::with_behaviour(Behaviour::Fail(reason))
    }

    /// Every connect attempt hangs forever after allocating a resource.
    pub fn hanging() -> Self {
        CountingConnector::with_behaviour(Behaviour::Hang)
    }

    /// Makes every later connect attempt fail with `reason`.
    pub fn start_failing(&self, reason: &'static str) {
        *self.behaviour.lock().unwrap() = Behaviour::Fail(reason);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Half-open attempts that were dropped before completing.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.tables.lock().unwrap().iter().cloned().collect();
        tables.sort();
        tables
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

struct HalfOpen(Arc<AtomicUsize>);

impl Drop for HalfOpen {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for CountingConnector {
    type Connection = FakeConnection;

    async fn connect(
        &self,
        _config: &ConnectionConfig,
        _command_timeout: Duration,
    ) -> Result<FakeConnection, sqlx::Error> {
        let behaviour = *self.behaviour.lock().unwrap();
        match behaviour {
            Behaviour::Connect => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                Ok(FakeConnection {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    tables: self.tables.clone(),
                    statements: self.statements.clone(),
                })
            }
            Behaviour::Fail(reason) => Err(sqlx::Error::Protocol(reason.to_string())),
            Behaviour::Hang => {
                let _socket = HalfOpen(self.abandoned.clone());
                futures::future::pending::<()>().await;
                unreachable!("pending never resolves")
            }
        }
    }

    async fn close(&self, _connection: FakeConnection) -> Result<(), sqlx::Error> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self, _connection: &mut FakeConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

pub struct FakeConnection {
    pub id: usize,
    tables: Arc<Mutex<HashSet<String>>>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl FakeConnection {
    fn apply_ddl(&self, sql: &str) -> Result<(), DatabaseError> {
        let words: Vec<&str> = sql.split_whitespace().collect();
        let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
        if upper.len() < 3 || upper[0] != "CREATE" || upper[1] != "TABLE" {
            return Ok(());
        }
        let if_not_exists = upper.len() > 5 && upper[2] == "IF" && upper[3] == "NOT" && upper[4] == "EXISTS";
        let name = if if_not_exists { words[5] } else { words[2] };
        let name = name.trim_end_matches('(').to_string();

        let mut tables = self.tables.lock().unwrap();
        if tables.contains(&name) && !if_not_exists {
            return Err(DatabaseError::Query(sqlx::Error::Protocol(format!(
                "relation \"{}\" already exists",
                name
            ))));
        }
        tables.insert(name);
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for FakeConnection {
    async fn execute(&mut self, sql: &str, _params: Vec<DatabaseValue>) -> Result<u64, DatabaseError> {
        self.statements.lock().unwrap().push(sql.trim().to_string());
        self.apply_ddl(sql)?;
        Ok(0)
    }

    async fn fetch_row(
        &mut self,
        sql: &str,
        _params: Vec<DatabaseValue>,
    ) -> Result<Option<PgRow>, DatabaseError> {
        self.statements.lock().unwrap().push(sql.trim().to_string());
        Ok(None)
    }

    async fn fetch_all(&mut self, sql: &str, _params: Vec<DatabaseValue>) -> Result<Vec<PgRow>, DatabaseError> {
        self.statements.lock().unwrap().push(sql.trim().to_string());
        Ok(Vec::new())
    }
}
