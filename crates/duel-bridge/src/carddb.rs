//! Card database backed by an ygopro `.cdb` SQLite file
//!
//! Only the `datas` table is read. Rows go through [`CardData::from_db_row`],
//! so packed levels, pendulum scales and link markers are unpacked the same
//! way for every card source.

use crate::engine::DuelCallbacks;
use duel_core::CardData;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

const CARD_QUERY: &str = "SELECT id, alias, setcode, type, level, attribute, race, atk, def \
                          FROM datas WHERE id = ?1";

/// Card database errors
#[derive(Debug, Error)]
pub enum CardDbError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("card database lock poisoned")]
    Poisoned,
}

/// Read-only card database
#[derive(Debug)]
pub struct CardDatabase {
    conn: Mutex<Connection>,
}

impl CardDatabase {
    /// Open an existing `.cdb` file read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CardDbError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!(path = %path.display(), "Opened card database");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Stats for `code`, `None` if the card is not in the database
    pub fn card(&self, code: u32) -> Result<Option<CardData>, CardDbError> {
        let conn = self.conn.lock().map_err(|_| CardDbError::Poisoned)?;
        let card = conn
            .query_row(CARD_QUERY, params![code], |row| {
                Ok(CardData::from_db_row(
                    row.get::<_, i64>(0)? as u32,
                    row.get::<_, i64>(1)? as u32,
                    row.get::<_, i64>(2)? as u64,
                    row.get::<_, i64>(3)? as u32,
                    row.get::<_, i64>(4)? as u32,
                    row.get::<_, i64>(5)? as u32,
                    row.get::<_, i64>(6)? as u64,
                    row.get::<_, i64>(7)? as i32,
                    row.get::<_, i64>(8)? as i32,
                ))
            })
            .optional()?;
        Ok(card)
    }

    /// Every table, index and view definition, one `-- type: name` block each
    pub fn schema(&self) -> Result<String, CardDbError> {
        let conn = self.conn.lock().map_err(|_| CardDbError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT type, name, sql FROM sqlite_master \
             WHERE name NOT LIKE 'sqlite_%' ORDER BY type, name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut schema = String::new();
        for row in rows {
            let (kind, name, sql) = row?;
            if let Some(sql) = sql {
                schema.push_str(&format!("-- {}: {}\n{};\n\n", kind, name, sql));
            }
        }
        Ok(schema)
    }
}

impl DuelCallbacks for CardDatabase {
    fn read_card(&self, code: u32) -> CardData {
        match self.card(code) {
            Ok(Some(card)) => card,
            Ok(None) => {
                debug!(code, "Card not in database, using blank stats");
                CardData::blank(code)
            }
            Err(e) => {
                warn!(code, error = %e, "Card lookup failed, using blank stats");
                CardData::blank(code)
            }
        }
    }
}
