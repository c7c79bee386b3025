//! Database connection and query execution.

use crate::{DbError, QueryResult, Row, Value};
use serde::de::DeserializeOwned;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Connection options for [`Db`].
#[derive(Debug, Clone)]
pub struct DbOptions {
    /// SQLite URL, e.g. `sqlite://shop.db` or `sqlite::memory:`.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// How long a writer waits on a locked database.
    pub busy_timeout: Duration,
}

impl DbOptions {
    /// Create options for a URL with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// SQLite database connection pool.
///
/// Provides type-safe query execution with automatic result deserialization.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open a database at the given URL, creating the file if needed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Db::connect("sqlite://shop.db").await?;
    /// ```
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        Self::connect_with(DbOptions::new(url)).await
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to one long-lived connection because every SQLite
    /// connection to `:memory:` sees its own database.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        Self::connect_with(DbOptions::new("sqlite::memory:")).await
    }

    /// Open a database with explicit options.
    pub async fn connect_with(options: DbOptions) -> Result<Self, DbError> {
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(|e| DbError::OpenError(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(options.busy_timeout);

        let pool_options = if options.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(options.max_connections)
        };

        let pool = pool_options
            .connect_with(connect)
            .await
            .map_err(|e| DbError::OpenError(e.to_string()))?;

        debug!(url = %options.url, "database opened");
        Ok(Self { pool })
    }

    /// Execute a SQL statement that doesn't return rows.
    ///
    /// Returns the number of affected rows.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.execute(
    ///     "INSERT INTO brands (id, name, slug) VALUES (?, ?, ?)",
    ///     params!["b-1", "Zebra", "zebra"],
    /// ).await?;
    /// ```
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let result = bind_params(sql, params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Execute a script of `;`-separated statements, e.g. a schema migration.
    pub async fn execute_script(&self, script: &str) -> Result<(), DbError> {
        for statement in split_statements(script) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Execute a SQL query and return raw results.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = db.query("SELECT name FROM products WHERE stock > ?", params![0]).await?;
    /// for row in result.iter() {
    ///     println!("{:?}", row.get("name").and_then(|v| v.as_text()));
    /// }
    /// ```
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        let rows = bind_params(sql, params).fetch_all(&self.pool).await?;
        convert_rows(&rows)
    }

    /// Execute a SQL query and deserialize results into a vector.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, DbError> {
        self.query(sql, params).await?.deserialize_all()
    }

    /// Execute a SQL query and return a single row.
    ///
    /// Returns an error if no rows are returned.
    pub async fn query_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<T, DbError> {
        let result = self.query(sql, params).await?;
        result.first().ok_or(DbError::NotFound)?.deserialize()
    }

    /// Execute a SQL query and return an optional single row.
    pub async fn query_optional<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        let result = self.query(sql, params).await?;
        result.first().map(Row::deserialize).transpose()
    }

    /// Begin a transaction.
    ///
    /// Dropping the transaction without calling [`Transaction::commit`]
    /// rolls it back.
    pub async fn begin(&self) -> Result<Transaction, DbError> {
        let inner = self.pool.begin().await?;
        Ok(Transaction { inner })
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open database transaction.
pub struct Transaction {
    inner: sqlx::Transaction<'static, Sqlite>,
}

impl Transaction {
    /// Execute a statement inside the transaction, returning affected rows.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let result = bind_params(sql, params).execute(&mut *self.inner).await?;
        Ok(result.rows_affected())
    }

    /// Run a query inside the transaction.
    pub async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        let rows = bind_params(sql, params).fetch_all(&mut *self.inner).await?;
        convert_rows(&rows)
    }

    /// Run a query inside the transaction and deserialize the rows.
    pub async fn query_as<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, DbError> {
        self.query(sql, params).await?.deserialize_all()
    }

    /// Run a query inside the transaction and return an optional single row.
    pub async fn query_optional<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        let result = self.query(sql, params).await?;
        result.first().map(Row::deserialize).transpose()
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), DbError> {
        self.inner.commit().await?;
        Ok(())
    }

    /// Roll the transaction back.
    pub async fn rollback(self) -> Result<(), DbError> {
        self.inner.rollback().await?;
        Ok(())
    }
}

fn bind_params<'q>(sql: &'q str, params: &'q [Value]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(sqlx::query(sql), |query, value| match value {
        Value::Null => query.bind(None::<i64>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Blob(b) => query.bind(b.as_slice()),
    })
}

fn convert_rows(rows: &[SqliteRow]) -> Result<QueryResult, DbError> {
    let rows = rows
        .iter()
        .map(|row| {
            let fields = row
                .columns()
                .iter()
                .map(|column| Ok((column.name().to_string(), convert_value(row, column.ordinal())?)))
                .collect::<Result<Vec<_>, DbError>>()?;
            Ok(Row::new(fields))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(QueryResult { rows })
}

fn convert_value(row: &SqliteRow, index: usize) -> Result<Value, DbError> {
    let (is_null, type_name) = {
        let raw = row.try_get_raw(index)?;
        (raw.is_null(), raw.type_info().name().to_string())
    };

    if is_null {
        return Ok(Value::Null);
    }

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        "NUMERIC" => match row.try_get_unchecked::<i64, _>(index) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Real(row.try_get_unchecked::<f64, _>(index)?),
        },
        _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// Split a script on `;`, skipping blank statements and `--` comment lines.
fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| {
            s.lines()
                .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Stock {
        id: String,
        stock: i64,
    }

    async fn setup() -> Db {
        let db = Db::open_in_memory().await.unwrap();
        db.execute_script(
            "-- test schema
             CREATE TABLE items (id TEXT PRIMARY KEY, stock INTEGER NOT NULL, note TEXT);
             CREATE UNIQUE INDEX items_note ON items(note);",
        )
        .await
        .unwrap();
        db.execute(
            "INSERT INTO items (id, stock, note) VALUES (?, ?, ?)",
            params!["a", 3, None::<String>],
        )
        .await
        .unwrap();
        db
    }

    #[test]
    fn test_split_statements() {
        let statements = split_statements("-- header\nCREATE TABLE a (x);\n\n;CREATE TABLE b (y);");
        assert_eq!(statements.len(), 2);
    }

    #[tokio::test]
    async fn test_query_as() {
        let db = setup().await;
        let rows: Vec<Stock> = db.query_as("SELECT id, stock FROM items", params![]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].stock, 3);
    }

    #[tokio::test]
    async fn test_conditional_update_reports_rows() {
        let db = setup().await;
        let hit = db
            .execute("UPDATE items SET stock = stock - ? WHERE id = ? AND stock >= ?", params![2, "a", 2])
            .await
            .unwrap();
        let miss = db
            .execute("UPDATE items SET stock = stock - ? WHERE id = ? AND stock >= ?", params![2, "a", 2])
            .await
            .unwrap();
        assert_eq!((hit, miss), (1, 0));
    }

    #[tokio::test]
    async fn test_transaction_rollback_on_drop() {
        let db = setup().await;
        {
            let mut tx = db.begin().await.unwrap();
            tx.execute("UPDATE items SET stock = 0 WHERE id = ?", params!["a"])
                .await
                .unwrap();
        }
        let stock: Stock = db
            .query_one("SELECT id, stock FROM items WHERE id = ?", params!["a"])
            .await
            .unwrap();
        assert_eq!(stock.stock, 3);
    }

    #[tokio::test]
    async fn test_unique_violation() {
        let db = setup().await;
        db.execute("INSERT INTO items (id, stock, note) VALUES ('b', 1, 'x')", params![])
            .await
            .unwrap();
        let err = db
            .execute("INSERT INTO items (id, stock, note) VALUES ('c', 1, 'x')", params![])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_null_and_aggregate_values() {
        let db = setup().await;
        let result = db
            .query("SELECT note, MIN(stock) AS min_stock FROM items", params![])
            .await
            .unwrap();
        let row = result.first().unwrap();
        assert!(row.get("note").unwrap().is_null());
        assert_eq!(row.get_i64("min_stock").unwrap(), 3);
    }
}
