//! Database access for the tagging tables
//!
//! Statements are built with sea-query, rendered for the backend detected
//! from the connection URL, and executed on a shared `sqlx::AnyPool`.

use crate::error::Result;
use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Transaction};
use std::sync::{Arc, Once};

static INSTALL_DRIVERS: Once = Once::new();

/// Register the sqlx `Any` drivers once per process
pub fn install_drivers() {
	INSTALL_DRIVERS.call_once(|| {
		sqlx::any::install_default_drivers();
	});
}

/// Database backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
	Postgres,
	MySql,
	Sqlite,
}

impl DatabaseBackend {
	/// Detect the backend from a connection URL
	///
	/// Anything that is not a PostgreSQL or MySQL URL is treated as SQLite.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_taggable::backend::DatabaseBackend;
	///
	/// assert_eq!(DatabaseBackend::from_url("postgresql://localhost/app"), DatabaseBackend::Postgres);
	/// assert_eq!(DatabaseBackend::from_url("sqlite::memory:"), DatabaseBackend::Sqlite);
	/// ```
	pub fn from_url(url: &str) -> Self {
		if url.starts_with("postgres://") || url.starts_with("postgresql://") {
			Self::Postgres
		} else if url.starts_with("mysql://") {
			Self::MySql
		} else {
			Self::Sqlite
		}
	}

	/// Whether `INSERT ... ON CONFLICT DO NOTHING` is available
	pub fn supports_on_conflict(&self) -> bool {
		!matches!(self, Self::MySql)
	}
}

/// Pool handle paired with the SQL dialect it speaks
#[derive(Debug, Clone)]
pub struct TagDatabase {
	pool: Arc<AnyPool>,
	backend: DatabaseBackend,
}

impl TagDatabase {
	/// Wrap an existing pool
	///
	/// `database_url` is only used to pick the SQL dialect.
	pub fn from_pool(pool: Arc<AnyPool>, database_url: &str) -> Self {
		Self {
			pool,
			backend: DatabaseBackend::from_url(database_url),
		}
	}

	/// Open a dedicated pool for `database_url`
	pub async fn connect(database_url: &str) -> Result<Self> {
		install_drivers();
		let pool = AnyPoolOptions::new().connect(database_url).await?;
		tracing::debug!(backend = ?DatabaseBackend::from_url(database_url), "Connected tag database");
		Ok(Self::from_pool(Arc::new(pool), database_url))
	}

	pub fn backend(&self) -> DatabaseBackend {
		self.backend
	}

	pub fn pool(&self) -> &AnyPool {
		self.pool.as_ref()
	}

	/// Build SQL string for the current database backend
	pub(crate) fn build_sql<T>(&self, statement: T) -> String
	where
		T: sea_query::QueryStatementWriter,
	{
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Build table SQL string for the current database backend
	pub(crate) fn build_table_sql<T>(&self, statement: T) -> String
	where
		T: sea_query::SchemaStatementBuilder,
	{
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Build index SQL string for the current database backend
	pub(crate) fn build_index_sql(&self, statement: &sea_query::IndexCreateStatement) -> String {
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Execute a statement, returning the number of affected rows
	pub(crate) async fn execute(&self, sql: &str) -> Result<u64> {
		let result = sqlx::query(sql).execute(self.pool()).await?;
		Ok(result.rows_affected())
	}

	pub(crate) async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>> {
		Ok(sqlx::query(sql).fetch_all(self.pool()).await?)
	}

	pub(crate) async fn fetch_optional(&self, sql: &str) -> Result<Option<AnyRow>> {
		Ok(sqlx::query(sql).fetch_optional(self.pool()).await?)
	}

	pub(crate) async fn begin(&self) -> Result<Transaction<'static, Any>> {
		Ok(self.pool.begin().await?)
	}
}
