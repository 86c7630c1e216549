use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Core value types for SQLite operations.
///
/// Variants mirror SQLite's runtime type tags, so a query result carries
/// whatever type the engine reports per value rather than what the schema
/// declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// One result row, keyed by column name.
pub type Row = HashMap<String, Value>;

/// Errors reported by the database wrapper.
///
/// The failing SQL text travels with the error so a fatal abort message
/// shows exactly which statement broke.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("SQL failed: {source}\nsql: {sql}")]
    Statement {
        sql: String,
        source: rusqlite::Error,
    },
}

impl DbError {
    fn statement(sql: &str, source: rusqlite::Error) -> Self {
        DbError::Statement {
            sql: sql.to_string(),
            source,
        }
    }

    /// The engine's primary result code, when the underlying error carries one.
    pub fn sqlite_code(&self) -> Option<rusqlite::ErrorCode> {
        let source = match self {
            DbError::Open { source, .. } => source,
            DbError::Statement { source, .. } => source,
        };
        match source {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.code),
            _ => None,
        }
    }
}

/// Convenience wrapper over one owned SQLite connection.
///
/// Callers never touch the `rusqlite` handle directly except through
/// [`GameStoreDb::prepare`], which lends out a compiled statement for
/// bind/step loops. All operations are synchronous; the connection lives as
/// long as the wrapper does.
pub struct GameStoreDb {
    conn: Connection,
}

impl GameStoreDb {
    /// Open (or create) a file-backed database and enable foreign-key
    /// enforcement.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| DbError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        let db = Self { conn };
        db.set_foreign_keys(true)?;
        Ok(db)
    }

    /// In-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Open {
            path: ":memory:".to_string(),
            source: e,
        })?;
        let db = Self { conn };
        db.set_foreign_keys(true)?;
        Ok(db)
    }

    /// Execute any SQL that should not return rows (DDL, updates,
    /// transaction control). May contain multiple statements.
    ///
    /// Callers pick the failure policy at the call site: `?` the error up
    /// for conditions the caller never expects, or match on it where a
    /// failure is deliberate.
    pub fn execute(&self, sql: &str) -> Result<(), DbError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::statement(sql, e))
    }

    /// Run a SELECT (or any row-returning statement) and materialize every
    /// row as a column-name-to-value map. The whole result set is read
    /// before returning.
    pub fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::statement(sql, e))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([]).map_err(|e| DbError::statement(sql, e))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DbError::statement(sql, e))? {
            let mut map = Row::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(|e| DbError::statement(sql, e))?;
                map.insert(name.clone(), Value::from(value));
            }
            result.push(map);
        }
        Ok(result)
    }

    /// Convenience: first column of the first row as an integer, or 0 when
    /// the query returns no rows. REAL results are truncated.
    pub fn scalar_int(&self, sql: &str) -> Result<i64, DbError> {
        let value = self
            .conn
            .query_row(sql, [], |row| Ok(Value::from(row.get_ref(0)?)))
            .optional()
            .map_err(|e| DbError::statement(sql, e))?;
        Ok(match value {
            Some(Value::Integer(i)) => i,
            Some(Value::Real(f)) => f as i64,
            _ => 0,
        })
    }

    /// Inspect schema metadata via `PRAGMA table_info` — handy for checking
    /// that a migration applied.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool, DbError> {
        let rows = self.query(&format!("PRAGMA table_info({table});"))?;
        Ok(rows
            .iter()
            .any(|row| row.get("name").and_then(Value::as_str) == Some(column)))
    }

    /// Prepare once, execute many. The statement is handed to `body` for
    /// the bind/step/reset cycle and finalized on drop on every exit path.
    pub fn prepare<F>(&self, sql: &str, body: F) -> Result<(), DbError>
    where
        F: FnOnce(&mut rusqlite::Statement<'_>) -> rusqlite::Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::statement(sql, e))?;
        body(&mut stmt).map_err(|e| DbError::statement(sql, e))
    }

    /// Toggle referential-integrity checking. The schema flow turns it off
    /// around table drops and back on immediately after.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<(), DbError> {
        self.execute(if enabled {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        })
    }

    // Simple wrappers around BEGIN / COMMIT / ROLLBACK.
    pub fn begin(&self) -> Result<(), DbError> {
        self.execute("BEGIN;")
    }

    pub fn commit(&self) -> Result<(), DbError> {
        self.execute("COMMIT;")
    }

    pub fn rollback(&self) -> Result<(), DbError> {
        self.execute("ROLLBACK;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reports_runtime_types() {
        let db = GameStoreDb::open_in_memory().expect("should open in-memory db");
        let rows = db
            .query("SELECT 1 AS i, 2.5 AS r, 'hi' AS t, NULL AS n")
            .expect("query should succeed");

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["i"], Value::Integer(1));
        assert_eq!(row["r"], Value::Real(2.5));
        assert_eq!(row["t"], Value::Text("hi".to_string()));
        assert_eq!(row["n"], Value::Null);
    }

    #[test]
    fn scalar_int_coerces_and_defaults() {
        let db = GameStoreDb::open_in_memory().expect("should open in-memory db");
        assert_eq!(db.scalar_int("SELECT 42").unwrap(), 42);
        assert_eq!(db.scalar_int("SELECT ROUND(41.6)").unwrap(), 42);
        assert_eq!(db.scalar_int("SELECT 1 WHERE 1 = 0").unwrap(), 0);
    }

    #[test]
    fn execute_error_carries_sql_text() {
        let db = GameStoreDb::open_in_memory().expect("should open in-memory db");
        let err = db
            .execute("NOT VALID SQL")
            .expect_err("bad SQL should fail");
        assert!(err.to_string().contains("NOT VALID SQL"));
    }
}
