pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

pub const MIGRATIONS_DIR: &str = "migrations";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    let applied = migrations::run_migrations(&conn, MIGRATIONS_DIR)?;
    tracing::debug!(applied, path, "database ready");

    Ok(conn)
}
