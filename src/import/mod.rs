mod record;
mod source;

pub use record::{map_record, MappedContact, NO_NAME};
pub use source::{ContactSource, FetchError, HttpSource};
