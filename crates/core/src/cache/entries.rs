//! Entry operations.
//!
//! Entries are keyed by request descriptor within a bucket. Writes use
//! UPSERT semantics so storing the same descriptor twice leaves one entry.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use super::timestamp;
use crate::Error;
use crate::http::{Request, Response, ResponseKind};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Listing view of a stored entry, without the body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub bucket: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub response_kind: ResponseKind,
    pub content_type: Option<String>,
    pub size: u64,
    pub stored_at: String,
}

/// Write one entry on an open connection or transaction.
fn upsert(conn: &rusqlite::Connection, bucket: &str, request: &Request, response: &Response) -> Result<(), Error> {
    let key = compute_entry_key(request.method(), request.url().as_str());
    let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
        params![bucket, timestamp()],
    )?;
    conn.execute(
        "INSERT INTO entries (
            bucket, key_hash, method, url, status, status_text,
            response_kind, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(bucket, key_hash) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            response_kind = excluded.response_kind,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            bucket,
            key,
            request.method(),
            request.url().as_str(),
            response.status,
            &response.status_text,
            response.kind.as_str(),
            headers_json,
            &response.body[..],
            timestamp(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response under the request's descriptor, creating the bucket
    /// if needed. Overwrites any previous entry for the descriptor.
    pub async fn put_entry(&self, bucket: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let request = request.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                upsert(&tx, &bucket, &request, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store every pair in one transaction: either all entries land, or none.
    ///
    /// Returns the number of distinct entries in the bucket afterwards.
    pub async fn put_all(&self, bucket: &str, pairs: Vec<(Request, Response)>) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, timestamp()],
                )?;
                for (request, response) in &pairs {
                    upsert(&tx, &bucket, request, response)?;
                }
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| row.get(0))?;
                tx.commit()?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for the request's descriptor in one bucket.
    ///
    /// Returns None if the bucket or the entry does not exist.
    pub async fn match_entry(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        let bucket = bucket.to_string();
        let key = compute_entry_key(request.method(), request.url().as_str());
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, response_kind, headers_json, body
                    FROM entries WHERE bucket = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![bucket, key], |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                });

                let (status, status_text, kind, headers_json, body) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers: BTreeMap<String, String> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

                Ok(Some(Response { status, status_text, headers, body: Bytes::from(body), kind: kind.parse()? }))
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries of a bucket, oldest write first.
    pub async fn entries(&self, bucket: &str) -> Result<Vec<CachedEntry>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, response_kind, headers_json, length(body), stored_at
                    FROM entries WHERE bucket = ?1 ORDER BY stored_at ASC, rowid ASC",
                )?;

                let rows = stmt
                    .query_map(params![bucket], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u16>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, i64>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut entries = Vec::with_capacity(rows.len());
                for (method, url, status, kind, headers_json, size, stored_at) in rows {
                    let headers: BTreeMap<String, String> =
                        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                    entries.push(CachedEntry {
                        bucket: bucket.clone(),
                        method,
                        url,
                        status,
                        response_kind: kind.parse()?,
                        content_type: headers.get("content-type").cloned(),
                        size: size as u64,
                        stored_at,
                    });
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
