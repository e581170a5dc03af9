// SQLite-backed contact store.
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use super::contact::{Contact, ContactFields};
use super::traits::{ContactStore, StoreError};

const DB_FILE: &str = "rolodex.sqlite";

/// Contacts inserted when the table is first found empty, in seed order.
const SEED_CONTACTS: [(&str, &str, &str); 3] = [
    ("Ada Lovelace", "+44 20 7946 0111", "ada@example.com"),
    ("Grace Hopper", "+1 202 555 0143", "grace@example.com"),
    ("Linus Pauling", "+1 626 555 0199", "linus@example.com"),
];

#[derive(Clone)]
pub struct SqliteStore {
    path: String,
}

impl SqliteStore {
    /// Build a store targeting the fixed database file under `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir
                .as_ref()
                .join(DB_FILE)
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// Remove the backing database file to force a clean start.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    /// One-time bootstrap: ensure the schema exists, seed an empty table, and
    /// guarantee at least one favorite by promoting the lowest id. Safe to
    /// call again; a populated table is left alone.
    pub fn init(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
            if total == 0 {
                let base = now_ms();
                let mut stmt = conn.prepare(
                    "INSERT INTO contacts (name, phone, email, favorite, created_at)
                     VALUES (?1, ?2, ?3, 0, ?4)",
                )?;
                for (index, (name, phone, email)) in SEED_CONTACTS.iter().enumerate() {
                    stmt.execute(params![name, phone, email, base + index as i64])?;
                }
            }

            let favorites: i64 = conn.query_row(
                "SELECT COUNT(*) FROM contacts WHERE favorite = 1",
                [],
                |row| row.get(0),
            )?;
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
            if favorites == 0 && total > 0 {
                conn.execute(
                    "UPDATE contacts SET favorite = 1 WHERE id = (SELECT MIN(id) FROM contacts)",
                    [],
                )?;
            }
            Ok(())
        })
        .map_err(StoreError::from)
    }

    /// Open a connection, ensure schema, and run the supplied closure.
    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        Self::migrate(&conn)?;
        f(&conn)
    }

    /// Create missing tables. Never destructive.
    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                favorite INTEGER DEFAULT 0,
                created_at INTEGER
            );
            "#,
        )
    }
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn map_contact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    let favorite: i64 = row.get(4)?;
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        favorite: favorite != 0,
        created_at: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
    })
}

fn db_list_contacts(conn: &Connection) -> rusqlite::Result<Vec<Contact>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, favorite, created_at FROM contacts
         ORDER BY favorite DESC, name COLLATE NOCASE ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([], map_contact_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_contact(
    conn: &Connection,
    fields: &ContactFields,
    favorite: bool,
    created_at: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO contacts (name, phone, email, favorite, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fields.name,
            fields.phone,
            fields.email,
            favorite as i64,
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_fields(
    conn: &Connection,
    id: i64,
    fields: &ContactFields,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE contacts SET name = ?1, phone = ?2, email = ?3 WHERE id = ?4",
        params![fields.name, fields.phone, fields.email, id],
    )
}

fn db_delete_contact(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM contacts WHERE id = ?1", params![id])
}

fn db_set_favorite(conn: &Connection, id: i64, favorite: bool) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE contacts SET favorite = ?1 WHERE id = ?2",
        params![favorite as i64, id],
    )
}

fn db_list_phones(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT phone FROM contacts WHERE phone IS NOT NULL")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl ContactStore for SqliteStore {
    fn list(&self) -> Result<Vec<Contact>, StoreError> {
        Ok(self.with_conn(db_list_contacts)?)
    }

    fn insert(
        &self,
        fields: &ContactFields,
        favorite: bool,
        created_at: i64,
    ) -> Result<i64, StoreError> {
        Ok(self.with_conn(|conn| db_insert_contact(conn, fields, favorite, created_at))?)
    }

    fn update_fields(&self, id: i64, fields: &ContactFields) -> Result<usize, StoreError> {
        Ok(self.with_conn(|conn| db_update_fields(conn, id, fields))?)
    }

    fn delete(&self, id: i64) -> Result<usize, StoreError> {
        Ok(self.with_conn(|conn| db_delete_contact(conn, id))?)
    }

    fn set_favorite(&self, id: i64, favorite: bool) -> Result<usize, StoreError> {
        Ok(self.with_conn(|conn| db_set_favorite(conn, id, favorite))?)
    }

    fn phones(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.with_conn(db_list_phones)?)
    }
}
