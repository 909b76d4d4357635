//! Stored responses within partitions.
//!
//! Writes replace any existing entry for the same (partition, key), so
//! concurrent writers resolve as last-write-wins.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite;
use tokio_rusqlite::{params, rusqlite::Row};

/// A response held in a cache partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// Request key, see [`super::hash::compute_request_key`].
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    /// Header (name, value) pairs in response order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(Self, String)> {
        Ok((
            Self {
                key: row.get(0)?,
                method: row.get(1)?,
                url: row.get(2)?,
                status: row.get(3)?,
                headers: Vec::new(),
                body: row.get(5)?,
                stored_at: row.get(6)?,
            },
            row.get(4)?,
        ))
    }

    fn with_headers(mut self, headers_json: &str) -> Result<Self, Error> {
        self.headers = serde_json::from_str(headers_json)?;
        Ok(self)
    }
}

const SELECT_COLUMNS: &str = "e.key, e.method, e.url, e.status, e.headers_json, e.body, e.stored_at";

fn insert(tx: &rusqlite::Transaction<'_>, partition: &str, response: &StoredResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    tx.execute(
        "INSERT INTO entries (partition, key, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(partition, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition,
            &response.key,
            &response.method,
            &response.url,
            response.status,
            headers_json,
            &response.body,
            &response.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response, creating the partition if needed.
    pub async fn put_response(&self, partition: &str, response: &StoredResponse) -> Result<(), Error> {
        self.put_responses(partition, vec![response.clone()]).await
    }

    /// Store a batch of responses in one transaction.
    ///
    /// Either every response is written or none is.
    pub async fn put_responses(&self, partition: &str, responses: Vec<StoredResponse>) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, now],
                )?;
                for response in &responses {
                    insert(&tx, &partition, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Find a response in any partition.
    ///
    /// Partitions are searched in creation order; the first hit wins.
    pub async fn match_response(&self, key: &str) -> Result<Option<StoredResponse>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM entries e
                     JOIN partitions p ON p.name = e.partition
                     WHERE e.key = ?1
                     ORDER BY p.seq ASC LIMIT 1"
                );
                let result = conn.query_row(&sql, params![key], StoredResponse::from_row);

                match result {
                    Ok((response, headers_json)) => response.with_headers(&headers_json).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Find a response in one partition.
    pub async fn match_in_partition(&self, partition: &str, key: &str) -> Result<Option<StoredResponse>, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM entries e WHERE e.partition = ?1 AND e.key = ?2");
                let result = conn.query_row(&sql, params![partition, key], StoredResponse::from_row);

                match result {
                    Ok((response, headers_json)) => response.with_headers(&headers_json).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the URLs stored in a partition, ordered by URL.
    pub async fn partition_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
