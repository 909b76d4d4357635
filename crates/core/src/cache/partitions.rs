//! Named cache partitions.
//!
//! A partition is created implicitly the first time something is written to
//! it and listed in creation order, the order lookups search them in.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Create a partition if it doesn't exist yet.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a partition exists.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List partition names in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// List partitions with their entry counts, in creation order.
    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.created_at, COUNT(e.key)
                     FROM partitions p LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.seq, p.name, p.created_at
                     ORDER BY p.seq ASC",
                )?;
                let partitions = stmt
                    .query_map([], |row| {
                        Ok(PartitionInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(partitions)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns false if no partition with that name existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_partition_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("holy-grail-static-v2").await.unwrap();
        db.open_partition("holy-grail-static-v2").await.unwrap();

        assert_eq!(db.partition_names().await.unwrap(), vec!["holy-grail-static-v2".to_string()]);
        assert!(db.has_partition("holy-grail-static-v2").await.unwrap());
        assert!(!db.has_partition("holy-grail-dynamic-v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_partition_names_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["c", "a", "b"] {
            db.open_partition(name).await.unwrap();
        }
        assert_eq!(db.partition_names().await.unwrap(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("old").await.unwrap();
        db.open_partition("new").await.unwrap();

        assert!(db.delete_partition("old").await.unwrap());
        assert!(!db.delete_partition("old").await.unwrap());
        assert_eq!(db.partition_names().await.unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn test_partitions_counts_empty() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("empty").await.unwrap();

        let partitions = db.partitions().await.unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].name, "empty");
        assert_eq!(partitions[0].entries, 0);
    }
}
