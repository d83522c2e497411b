//! Database connection management with pragma configuration.
//!
//! Opens the SQLite file, applies pragmas for durability and concurrent
//! readers (WAL mode), and runs migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Product store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning shares the same connection.
#[derive(Clone, Debug)]
pub struct ProductDb {
    pub(crate) conn: Connection,
}

impl ProductDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and runs any
    /// pending migrations. Fails with `Error::StorageUnavailable` when the
    /// location cannot hold a database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let display = path.as_ref().display().to_string();
        let conn = Connection::open(path)
            .await
            .map_err(|e| Error::StorageUnavailable(format!("{display}: {e}")))?;

        Self::prepare(conn)
            .await
            .map_err(|e| match e {
                Error::Database(inner) => Error::StorageUnavailable(format!("{display}: {inner}")),
                other => other,
            })
    }

    /// Open an in-memory database.
    ///
    /// Same pragmas and schema as a file-backed store; contents vanish when
    /// the last handle is dropped.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        tracing::debug!("product store ready");

        Ok(Self { conn })
    }
}
