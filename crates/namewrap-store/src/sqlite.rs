//! SQLite implementation of the RecordStore trait.
//!
//! This is the persistent storage backend. It uses rusqlite with bundled
//! SQLite; every batch runs inside a single transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use namewrap_core::{DnsName, Node, Principal};
use namewrap_perms::{Fuses, NameRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{RecordStore, StoreWrite, WriteBatch};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&mut conn)
    }
}

// Expiry is a u64 but SQLite integers are signed; store the bit pattern.
fn expiry_to_sql(expiry: u64) -> i64 {
    expiry as i64
}

fn expiry_from_sql(value: i64) -> u64 {
    value as u64
}

fn decode_record(owner: Vec<u8>, fuses: i64, expiry: i64) -> Result<NameRecord> {
    let owner = Principal::try_from(owner.as_slice())
        .map_err(|e| StoreError::InvalidData(format!("owner: {}", e)))?;
    let bits = u32::try_from(fuses)
        .map_err(|_| StoreError::InvalidData(format!("fuses out of range: {}", fuses)))?;
    let fuses = Fuses::from_raw(bits).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    NameRecord::new(owner, fuses, expiry_from_sql(expiry))
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn apply_write(tx: &Transaction<'_>, write: &StoreWrite) -> Result<()> {
    match write {
        StoreWrite::PutRecord { node, record } => {
            tx.execute(
                "INSERT INTO records (node, owner, fuses, expiry) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(node) DO UPDATE SET
                    owner = excluded.owner,
                    fuses = excluded.fuses,
                    expiry = excluded.expiry",
                params![
                    node.as_bytes().as_slice(),
                    record.owner().as_bytes().as_slice(),
                    record.fuses().bits() as i64,
                    expiry_to_sql(record.expiry()),
                ],
            )?;
        }
        StoreWrite::RemoveRecord { node } => {
            tx.execute(
                "DELETE FROM records WHERE node = ?1",
                params![node.as_bytes().as_slice()],
            )?;
        }
        StoreWrite::PutName { node, name } => {
            tx.execute(
                "INSERT INTO names (node, wire) VALUES (?1, ?2)
                 ON CONFLICT(node) DO UPDATE SET wire = excluded.wire",
                params![node.as_bytes().as_slice(), name.to_wire()],
            )?;
        }
        StoreWrite::SetApproval {
            owner,
            operator,
            approved,
        } => {
            if *approved {
                tx.execute(
                    "INSERT OR IGNORE INTO operator_approvals (owner, operator) VALUES (?1, ?2)",
                    params![owner.as_bytes().as_slice(), operator.as_bytes().as_slice()],
                )?;
            } else {
                tx.execute(
                    "DELETE FROM operator_approvals WHERE owner = ?1 AND operator = ?2",
                    params![owner.as_bytes().as_slice(), operator.as_bytes().as_slice()],
                )?;
            }
        }
    }
    Ok(())
}

impl RecordStore for SqliteStore {
    fn get_record(&self, node: &Node) -> Result<Option<NameRecord>> {
        self.with_conn(|conn| {
            let row: Option<(Vec<u8>, i64, i64)> = conn
                .query_row(
                    "SELECT owner, fuses, expiry FROM records WHERE node = ?1",
                    params![node.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            row.map(|(owner, fuses, expiry)| decode_record(owner, fuses, expiry))
                .transpose()
        })
    }

    fn get_name(&self, node: &Node) -> Result<Option<DnsName>> {
        self.with_conn(|conn| {
            let wire: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT wire FROM names WHERE node = ?1",
                    params![node.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            wire.map(|bytes| {
                DnsName::from_wire(&bytes).map_err(|e| StoreError::InvalidData(e.to_string()))
            })
            .transpose()
        })
    }

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM operator_approvals WHERE owner = ?1 AND operator = ?2",
                    params![owner.as_bytes().as_slice(), operator.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn record_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    fn apply(&self, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for write in batch.writes() {
                apply_write(&tx, write)?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}
