mod contact;
pub mod sqlite;
pub mod traits;

pub use contact::{Contact, ContactFields};
pub use sqlite::SqliteStore;
pub use traits::{ContactStore, StoreError};
