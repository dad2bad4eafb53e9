//! Throwaway Postgres databases for prowl's storage and service tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use time::OffsetDateTime;
use tokio::runtime::Builder;
use uuid::Uuid;

use prowl_config::Postgres;
use prowl_domain::ContentTarget;
use prowl_storage::{db::Db, queries};

const DSN_VAR: &str = "PROWL_PG_DSN";
const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const POOL_MAX_CONNS: u32 = 4;

pub fn env_dsn() -> Option<String> {
	env::var(DSN_VAR).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A `prowl_test_*` database, dropped on cleanup or drop.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid {DSN_VAR}: {err}.")))?;
		let (maintenance, mut conn) = connect_maintenance(&base).await?;
		let name = format!("prowl_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Connects to the database and applies the search schema.
	pub async fn bootstrap(&self) -> Result<Db> {
		let cfg = Postgres { dsn: self.dsn.clone(), pool_max_conns: POOL_MAX_CONNS };
		let db = Db::connect(&cfg).await?;

		db.ensure_schema().await?;

		Ok(db)
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.maintenance).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// Runs outside the test runtime, which may already be gone.
		let handle = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(err.to_string()))
				.and_then(|runtime| runtime.block_on(drop_database(&name, &maintenance)));

			if let Err(err) = result {
				eprintln!("Failed to drop test database {name}: {err}.");
			}
		});
		let _ = handle.join();
	}
}

/// Inserts a content target with no search history.
pub async fn seed_content(db: &Db, url: &str, text: &str) -> Result<ContentTarget> {
	let content = ContentTarget {
		content_id: Uuid::new_v4(),
		url: url.to_string(),
		text: text.to_string(),
		feedback: None,
		best_attempt_id: None,
		search_status: None,
	};

	queries::insert_content(db, &content, OffsetDateTime::now_utc()).await?;

	Ok(content)
}

async fn connect_maintenance(
	base: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("No maintenance database reachable: {last_err:?}.")))
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;

	Ok(())
}
