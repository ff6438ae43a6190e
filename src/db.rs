use std::{path::Path, sync::Arc};

use rusqlite::params;
use tokio::sync::Mutex;

use crate::model;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no record for code {0:?}")]
    NotFound(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Clone, Debug)]
pub struct RecordDAO {
    connection: Arc<Mutex<rusqlite::Connection>>,
}

/// Db is the process-wide store handle. Clones share one connection.
#[derive(Clone, Debug)]
pub struct Db {
    pub record: RecordDAO,
}

fn from_row(row: &rusqlite::Row<'_>) -> Result<model::Record, rusqlite::Error> {
    Ok(model::Record {
        code: row.get(0)?,
        url: row.get(1)?,
        password_hash: row.get(2)?,
        created: row.get(3)?,
        scans: row.get(4)?,
    })
}

impl RecordDAO {
    fn new(connection: Arc<Mutex<rusqlite::Connection>>) -> Self {
        Self { connection }
    }

    /// Stores `record` under its code, replacing whatever was there.
    pub async fn put(&self, record: &model::Record) -> Result<(), DbError> {
        let conn = self.connection.lock().await;

        conn.execute(
            r#"INSERT OR REPLACE INTO qrcode (code, url, password, created, scans) values (?1, ?2, ?3, ?4, ?5)"#,
            params![
                record.code,
                record.url,
                record.password_hash,
                record.created,
                record.scans
            ],
        )?;

        Ok(())
    }

    pub async fn get(&self, code: &str) -> Result<Option<model::Record>, DbError> {
        let conn = self.connection.lock().await;

        let mut stmt = conn.prepare(r#"SELECT code, url, password, created, scans FROM qrcode WHERE code = ?1"#)?;
        match stmt.query_one([code], from_row) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies the set fields of `update`; `scans`, `created` and the digest are never touched.
    pub async fn update_fields(&self, code: &str, update: &model::RecordUpdate) -> Result<(), DbError> {
        let conn = self.connection.lock().await;

        let changed = conn.execute(
            r#"UPDATE qrcode SET url = COALESCE(?2, url) WHERE code = ?1"#,
            params![code, update.url],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound(code.to_string()));
        }

        Ok(())
    }

    /// Bumps the scan counter in a single statement so concurrent scans are never lost.
    pub async fn increment_scan(&self, code: &str) -> Result<(), DbError> {
        let conn = self.connection.lock().await;

        let changed = conn.execute(r#"UPDATE qrcode SET scans = scans + 1 WHERE code = ?1"#, [code])?;
        if changed == 0 {
            return Err(DbError::NotFound(code.to_string()));
        }

        Ok(())
    }

    /// Removes the record if present. Deleting an unknown code is not an error.
    pub async fn delete(&self, code: &str) -> Result<(), DbError> {
        let conn = self.connection.lock().await;

        conn.execute(r#"DELETE FROM qrcode WHERE code = ?1"#, [code])?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<model::Record>, DbError> {
        let conn = self.connection.lock().await;

        let mut stmt: rusqlite::Statement<'_> =
            conn.prepare(r#"SELECT code, url, password, created, scans FROM qrcode ORDER BY created, code"#)?;
        let records = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<model::Record>, rusqlite::Error>>()?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<usize, DbError> {
        let conn = self.connection.lock().await;

        let count: i64 = conn.query_row(r#"SELECT COUNT(*) FROM qrcode"#, [], |row| row.get(0))?;

        Ok(count as usize)
    }
}

fn create_qrcode_table(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        r#"create table if not exists qrcode(
    code     TEXT    PRIMARY KEY,
	url      TEXT    NOT NULL,
	password TEXT    NOT NULL,           -- hex sha256 of the record password
	created  TEXT    NOT NULL,
	scans    INTEGER NOT NULL DEFAULT 0
)"#,
        (),
    )?;

    Ok(())
}

impl Db {
    pub fn new(connection: rusqlite::Connection) -> Result<Self, DbError> {
        create_qrcode_table(&connection)?;

        Ok(Self {
            record: RecordDAO::new(Arc::new(Mutex::new(connection))),
        })
    }

    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::new(rusqlite::Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, DbError> {
        Self::new(rusqlite::Connection::open_in_memory()?)
    }
}
