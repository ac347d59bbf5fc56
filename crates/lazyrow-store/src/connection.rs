//! The single physical connection and the gate serializing access to it
//!
//! A `ConnectionGate` owns at most one `rusqlite::Connection` together with
//! the schema registry describing it. Every open, close and unit of work
//! takes the gate's mutex and hands it back with `unlock_fair`, so callers
//! blocked on the gate are served in arrival order.

use crate::config::StoreConfig;
use crate::db;
use crate::errors::{connection_closed, from_rusqlite, sql_error, Result};
use crate::migrations::apply_migrations;
use crate::registry::SchemaRegistry;
use lazyrow_core::errors::{ExError, ExErrorKind};
use lazyrow_core::sql::{SqlValue, Statement};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::Value as SqliteValue;
use rusqlite::Connection;

struct GateState {
    conn: Option<Connection>,
    refs: usize,
    registry: SchemaRegistry,
}

/// Reference-counted owner of the connection
pub struct ConnectionGate {
    config: StoreConfig,
    state: Mutex<GateState>,
}

impl ConnectionGate {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: Mutex::new(GateState {
                conn: None,
                refs: 0,
                registry: SchemaRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Take a reference; the first one opens, configures and migrates
    pub fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        let result = self.open_locked(&mut state);
        MutexGuard::unlock_fair(state);
        result
    }

    fn open_locked(&self, state: &mut GateState) -> Result<()> {
        if state.refs == 0 {
            let mut conn = match &self.config.database {
                Some(path) => db::open(path)?,
                None => db::open_in_memory()?,
            };
            db::configure(&conn, &self.config)?;
            apply_migrations(&mut conn)?;
            state.conn = Some(conn);
            state.registry = SchemaRegistry::new();
            tracing::debug!(database = ?self.config.database, "connection opened");
        }
        state.refs += 1;
        Ok(())
    }

    /// Release a reference; the last one closes the connection
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        let result = Self::close_locked(&mut state);
        MutexGuard::unlock_fair(state);
        result
    }

    fn close_locked(state: &mut GateState) -> Result<()> {
        if state.refs == 0 {
            return Err(connection_closed());
        }
        state.refs -= 1;
        if state.refs == 0 {
            if let Some(conn) = state.conn.take() {
                conn.close().map_err(|(_, e)| from_rusqlite(e))?;
            }
            state.registry = SchemaRegistry::new();
            tracing::debug!("connection closed");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        let open = state.conn.is_some();
        MutexGuard::unlock_fair(state);
        open
    }

    /// Run `work` inside one engine transaction
    ///
    /// Commits when `work` succeeds. On failure the transaction rolls back and
    /// the registry forgets every schema it changed inside it.
    pub fn transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&SqlSession<'_>, &mut SchemaRegistry) -> Result<T>,
    {
        let mut guard = self.state.lock();
        let result = Self::transaction_locked(&mut guard, work);
        MutexGuard::unlock_fair(guard);
        result
    }

    fn transaction_locked<T, F>(state: &mut GateState, work: F) -> Result<T>
    where
        F: FnOnce(&SqlSession<'_>, &mut SchemaRegistry) -> Result<T>,
    {
        let GateState { conn, registry, .. } = state;
        let conn = conn.as_mut().ok_or_else(connection_closed)?;
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let outcome = {
            let session = SqlSession::new(&tx);
            work(&session, &mut *registry)
        };

        match outcome {
            Ok(value) => match tx.commit() {
                Ok(()) => {
                    registry.commit();
                    Ok(value)
                }
                Err(e) => {
                    registry.rollback();
                    Err(from_rusqlite(e))
                }
            },
            Err(err) => {
                if let Err(e) = tx.rollback() {
                    tracing::warn!(error = %e, "rollback failed");
                }
                registry.rollback();
                Err(err)
            }
        }
    }
}

/// Statement execution against a borrowed connection
pub struct SqlSession<'a> {
    conn: &'a Connection,
}

impl<'a> SqlSession<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn trace(stmt: &Statement) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(sql = %stmt.to_literal_sql(), "statement");
        }
    }

    /// Execute and return the number of affected rows
    pub fn execute(&self, stmt: &Statement) -> Result<usize> {
        Self::trace(stmt);
        self.conn
            .execute(&stmt.sql, rusqlite::params_from_iter(bind(stmt)))
            .map_err(|e| sql_error(stmt, e))
    }

    pub fn execute_all(&self, stmts: &[Statement]) -> Result<()> {
        for stmt in stmts {
            self.execute(stmt)?;
        }
        Ok(())
    }

    /// Execute an INSERT and return the generated row identity
    pub fn insert_returning_id(&self, stmt: &Statement) -> Result<i64> {
        self.execute(stmt)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Run a query and collect every row
    pub fn query(&self, stmt: &Statement) -> Result<Vec<Vec<SqlValue>>> {
        Self::trace(stmt);
        let mut prepared = self.conn.prepare(&stmt.sql).map_err(|e| sql_error(stmt, e))?;
        let width = prepared.column_count();

        let rows = prepared
            .query_map(rusqlite::params_from_iter(bind(stmt)), |row| {
                (0..width)
                    .map(|i| row.get::<_, SqliteValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| sql_error(stmt, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| sql_error(stmt, e))?;

        rows.into_iter()
            .map(|row| row.into_iter().map(unbind).collect())
            .collect()
    }

    /// Run a query whose first column of the first row is a count
    pub fn scalar_count(&self, stmt: &Statement) -> Result<i64> {
        let rows = self.query(stmt)?;
        match rows.first().and_then(|r| r.first()) {
            Some(SqlValue::Integer(n)) => Ok(*n),
            other => Err(ExError::new(ExErrorKind::Persistence)
                .with_op("scalar_count")
                .with_message(format!("expected an integer count, got {:?}", other))),
        }
    }

    /// The underlying connection, for statements outside the builders
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

fn bind(stmt: &Statement) -> impl Iterator<Item = SqliteValue> + '_ {
    stmt.params.iter().map(|p| match p {
        SqlValue::Null => SqliteValue::Null,
        SqlValue::Integer(i) => SqliteValue::Integer(*i),
        SqlValue::Real(f) => SqliteValue::Real(*f),
        SqlValue::Text(s) => SqliteValue::Text(s.clone()),
    })
}

fn unbind(value: SqliteValue) -> Result<SqlValue> {
    Ok(match value {
        SqliteValue::Null => SqlValue::Null,
        SqliteValue::Integer(i) => SqlValue::Integer(i),
        SqliteValue::Real(f) => SqlValue::Real(f),
        SqliteValue::Text(s) => SqlValue::Text(s),
        SqliteValue::Blob(_) => {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("decode")
                .with_message("blob values are not supported"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ConnectionGate {
        let gate = ConnectionGate::new(StoreConfig::default());
        gate.open().unwrap();
        gate
    }

    #[test]
    fn test_open_close_are_reference_counted() {
        let gate = gate();
        gate.open().unwrap();
        gate.close().unwrap();
        assert!(gate.is_open());
        gate.close().unwrap();
        assert!(!gate.is_open());

        let err = gate.close().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::IllegalState);
    }

    #[test]
    fn test_transaction_on_closed_gate_fails() {
        let gate = ConnectionGate::new(StoreConfig::default());
        let err = gate.transaction(|_, _| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::IllegalState);
    }

    #[test]
    fn test_session_round_trip() {
        let gate = gate();
        let count = gate
            .transaction(|s, _| {
                s.execute(&Statement::new("CREATE TABLE t (x INTEGER, y TEXT)"))?;
                let id = s.insert_returning_id(&Statement::with_params(
                    "INSERT INTO t (x, y) VALUES (?, ?)",
                    vec![SqlValue::Integer(1), SqlValue::Text("a".to_string())],
                ))?;
                assert_eq!(id, 1);
                let rows = s.query(&Statement::new("SELECT x, y FROM t"))?;
                assert_eq!(
                    rows,
                    vec![vec![SqlValue::Integer(1), SqlValue::Text("a".to_string())]]
                );
                s.scalar_count(&Statement::new("SELECT COUNT(*) FROM t"))
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_failed_work_rolls_back() {
        let gate = gate();
        gate.transaction(|s, _| s.execute(&Statement::new("CREATE TABLE t (x INTEGER)")))
            .unwrap();

        let err = gate
            .transaction(|s, _| {
                s.execute(&Statement::new("INSERT INTO t (x) VALUES (1)"))?;
                s.execute(&Statement::new("INSERT INTO missing (x) VALUES (1)"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::SqlExecution);

        let count = gate
            .transaction(|s, _| s.scalar_count(&Statement::new("SELECT COUNT(*) FROM t")))
            .unwrap();
        assert_eq!(count, 0);
    }
}
