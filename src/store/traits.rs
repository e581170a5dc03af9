// Persistence seam for the contacts table.
use thiserror::Error;

use super::contact::{Contact, ContactFields};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ContactStore {
    /// All contacts, favorites first, then name ascending case-insensitively.
    fn list(&self) -> Result<Vec<Contact>, StoreError>;

    /// Inserts one row and returns its assigned id.
    fn insert(
        &self,
        fields: &ContactFields,
        favorite: bool,
        created_at: i64,
    ) -> Result<i64, StoreError>;

    /// Rewrites name/phone/email for the matching row, leaving favorite and
    /// created_at untouched. Returns the number of rows affected.
    fn update_fields(&self, id: i64, fields: &ContactFields) -> Result<usize, StoreError>;

    /// Removes the matching row. Returns the number of rows affected.
    fn delete(&self, id: i64) -> Result<usize, StoreError>;

    /// Sets the favorite flag on the matching row only.
    fn set_favorite(&self, id: i64, favorite: bool) -> Result<usize, StoreError>;

    /// All non-null phone values currently in the table.
    fn phones(&self) -> Result<Vec<String>, StoreError>;
}
