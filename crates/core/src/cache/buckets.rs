//! Bucket operations.
//!
//! A bucket is a named set of entries. Deleting a bucket deletes its
//! entries with it (`ON DELETE CASCADE`).

use super::connection::CacheDb;
use super::timestamp;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Create the bucket if it does not exist yet.
    pub async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All bucket names in creation order.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and all of its entries.
    ///
    /// Returns false if there was no bucket with that name.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every bucket except `keep`, in one transaction.
    ///
    /// Returns the names of the deleted buckets in creation order.
    pub async fn retain_bucket(&self, keep: &str) -> Result<Vec<String>, Error> {
        let keep = keep.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale = {
                    let mut stmt = tx.prepare("SELECT name FROM buckets WHERE name <> ?1 ORDER BY rowid")?;
                    let names = stmt
                        .query_map(params![keep], |row| row.get(0))?
                        .collect::<Result<Vec<String>, _>>()?;
                    names
                };
                for name in &stale {
                    tx.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                }
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_bucket_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("gm-campbell-v5").await.unwrap();
        db.open_bucket("gm-campbell-v5").await.unwrap();

        assert_eq!(db.bucket_names().await.unwrap(), vec!["gm-campbell-v5".to_string()]);
    }

    #[tokio::test]
    async fn test_bucket_names_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("gm-campbell-v4").await.unwrap();
        db.open_bucket("gm-campbell-v5").await.unwrap();
        db.open_bucket("alpha").await.unwrap();

        assert_eq!(db.bucket_names().await.unwrap(), vec!["gm-campbell-v4", "gm-campbell-v5", "alpha"]);
    }

    #[tokio::test]
    async fn test_delete_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("gm-campbell-v4").await.unwrap();

        assert!(db.delete_bucket("gm-campbell-v4").await.unwrap());
        assert!(!db.delete_bucket("gm-campbell-v4").await.unwrap());
        assert!(!db.has_bucket("gm-campbell-v4").await.unwrap());
    }

    #[tokio::test]
    async fn test_retain_bucket_deletes_others() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("gm-campbell-v3").await.unwrap();
        db.open_bucket("gm-campbell-v4").await.unwrap();
        db.open_bucket("gm-campbell-v5").await.unwrap();

        let deleted = db.retain_bucket("gm-campbell-v5").await.unwrap();

        assert_eq!(deleted, vec!["gm-campbell-v3", "gm-campbell-v4"]);
        assert_eq!(db.bucket_names().await.unwrap(), vec!["gm-campbell-v5"]);
    }

    #[tokio::test]
    async fn test_retain_bucket_when_current_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("gm-campbell-v4").await.unwrap();

        let deleted = db.retain_bucket("gm-campbell-v5").await.unwrap();

        assert_eq!(deleted, vec!["gm-campbell-v4"]);
        assert!(db.bucket_names().await.unwrap().is_empty());
    }
}
