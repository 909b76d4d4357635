//! Schema migrations for cache storage.
//!
//! Applied versions are recorded in `_migrations`. Each migration runs in
//! its own transaction together with its version row, so a failing batch
//! leaves neither half-created tables nor a recorded version behind.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Known migrations in ascending version order.
pub(crate) const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "partitions",
    sql: include_str!("../../migrations/001_partitions.sql"),
}];

/// Apply every migration newer than the recorded version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` when a batch fails or the database was
/// written by a newer schema than this build knows.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| apply(conn, MIGRATIONS)).await.map_err(Error::from)
}

pub(crate) fn apply(conn: &mut rusqlite::Connection, migrations: &[Migration]) -> Result<(), Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    let latest = migrations.last().map_or(0, |m| m.version);
    if current > latest {
        return Err(Error::MigrationFailed(format!(
            "cache schema version {current} is newer than supported version {latest}"
        )));
    }

    for migration in migrations.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
        tx.execute(
            "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(conn: &Connection, sql: &'static str) -> i64 {
        conn.call(move |conn| conn.query_row(sql, [], |row| row.get::<_, i64>(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let tables = count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('partitions', 'entries')",
        )
        .await;
        assert_eq!(tables, 2);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations").await, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        const BROKEN: &[Migration] = &[Migration {
            version: 1,
            name: "broken",
            sql: "CREATE TABLE partitions (name TEXT PRIMARY KEY);
                  CREATE TABLE entries (partition TEXT REFERENCES partitions(name) ON DELETE CASCADE);
                  CREATE TABLE broken (;",
        }];

        let conn = Connection::open_in_memory().await.unwrap();
        let err = conn.call(|conn| apply(conn, BROKEN)).await.map_err(Error::from).unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(ref msg) if msg.contains("broken")));

        let tables = count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('partitions', 'entries')",
        )
        .await;
        assert_eq!(tables, 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations").await, 0);

        run(&conn).await.unwrap();
        assert_eq!(count(&conn, "SELECT MAX(version) FROM _migrations").await, 1);
    }

    #[tokio::test]
    async fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        conn.call(|conn| {
            conn.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (99, 'future', '2030-01-01T00:00:00Z')",
                [],
            )
        })
        .await
        .unwrap();

        let err = run(&conn).await.unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(_)));
    }
}
