use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_bookmarks.sql", include_str!("migrations/001_bookmarks.sql"))];

pub const IN_MEMORY: &str = ":memory:";

pub struct Database {
    _db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in the config. Relative paths resolve against `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let name = cfg.app.get_db();
        if name == IN_MEMORY {
            return Self::open_in_memory().await;
        }
        Self::open(&data_dir.join(name)).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        tracing::info!(path = ?path, "[db] opening local database");
        let db = Builder::new_local(path).build().await?;
        Self::init(db).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(IN_MEMORY).build().await?;
        Self::init(db).await
    }

    async fn init(db: LibsqlDatabase) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { _db: db, conn })
    }
}
