//! The contact repository: owns the persistent table through a store seam,
//! keeps a wholesale snapshot for consumers, and merges remote records.
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::import::{map_record, ContactSource, FetchError};
use crate::store::sqlite::now_ms;
use crate::store::{Contact, ContactFields, ContactStore, StoreError};

/// How a mutation failed. `Refresh` means the write itself went through but
/// the follow-up snapshot reload did not; callers can rely on the change
/// being persisted in that case.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("contact name must not be empty")]
    EmptyName,
    #[error("write failed: {0}")]
    Write(#[source] StoreError),
    #[error("change saved, but reloading contacts failed: {0}")]
    Refresh(#[source] StoreError),
}

/// How an import failed. `inserted` counts rows already committed before the
/// failure; they are not rolled back, and re-running the import skips them
/// via phone dedup.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("an import is already running")]
    Busy,
    #[error("fetching import source failed: {0}")]
    Fetch(#[source] FetchError),
    #[error("import stopped after {inserted} contacts: {source}")]
    Store {
        inserted: usize,
        #[source]
        source: StoreError,
    },
    #[error("imported {inserted} contacts, but reloading failed: {source}")]
    Refresh {
        inserted: usize,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Default)]
struct View {
    contacts: Vec<Contact>,
    query: String,
    favorites_only: bool,
}

pub struct ContactRepository<S> {
    store: S,
    view: Mutex<View>,
    import_busy: AtomicBool,
}

impl<S: ContactStore> ContactRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            view: Mutex::new(View::default()),
            import_busy: AtomicBool::new(false),
        }
    }

    /// Full ordered read; replaces the cached snapshot wholesale.
    pub fn list(&self) -> Result<Vec<Contact>, StoreError> {
        let contacts = self.store.list()?;
        self.view.lock().unwrap().contacts = contacts.clone();
        Ok(contacts)
    }

    /// The cached snapshot, unfiltered.
    pub fn snapshot(&self) -> Vec<Contact> {
        self.view.lock().unwrap().contacts.clone()
    }

    /// The cached snapshot with the current query and favorites filter
    /// applied. Never touches the store.
    pub fn visible(&self) -> Vec<Contact> {
        let view = self.view.lock().unwrap();
        let query = view.query.to_lowercase();
        view.contacts
            .iter()
            .filter(|c| !view.favorites_only || c.favorite)
            .filter(|c| {
                query.is_empty()
                    || c.name.to_lowercase().contains(&query)
                    || c.phone
                        .as_deref()
                        .is_some_and(|p| p.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<Contact> {
        self.snapshot().into_iter().find(|c| c.id == id)
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.view.lock().unwrap().query = query.into();
    }

    pub fn query(&self) -> String {
        self.view.lock().unwrap().query.clone()
    }

    pub fn set_favorites_only(&self, favorites_only: bool) {
        self.view.lock().unwrap().favorites_only = favorites_only;
    }

    pub fn favorites_only(&self) -> bool {
        self.view.lock().unwrap().favorites_only
    }

    pub fn add(
        &self,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), MutationError> {
        let fields =
            ContactFields::normalized(name, phone, email).ok_or(MutationError::EmptyName)?;
        self.store
            .insert(&fields, false, now_ms())
            .map_err(MutationError::Write)?;
        self.reload_after_write()
    }

    /// Rewrites name/phone/email only. A missing `id` is a silent no-op:
    /// callers cannot tell it apart from a hit by the return value alone.
    pub fn update(
        &self,
        id: i64,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), MutationError> {
        let fields =
            ContactFields::normalized(name, phone, email).ok_or(MutationError::EmptyName)?;
        self.store
            .update_fields(id, &fields)
            .map_err(MutationError::Write)?;
        self.reload_after_write()
    }

    pub fn delete(&self, id: i64) -> Result<(), MutationError> {
        self.store.delete(id).map_err(MutationError::Write)?;
        self.reload_after_write()
    }

    /// Optimistic toggle: writes the opposite of the flag the caller
    /// observed. A stale `contact` overwrites whatever the row holds now.
    pub fn toggle_favorite(&self, contact: &Contact) -> Result<(), MutationError> {
        self.store
            .set_favorite(contact.id, !contact.favorite)
            .map_err(MutationError::Write)?;
        self.reload_after_write()
    }

    /// One-shot merge of remote records, deduplicated by phone number.
    /// Returns the number of rows actually inserted. At most one import may
    /// run at a time; a second call while one is in flight is rejected.
    pub async fn import<Src>(&self, source: &Src) -> Result<usize, ImportError>
    where
        Src: ContactSource + Sync + ?Sized,
    {
        if self.import_busy.swap(true, Ordering::SeqCst) {
            return Err(ImportError::Busy);
        }
        let result = self.import_inner(source).await;
        self.import_busy.store(false, Ordering::SeqCst);
        result
    }

    async fn import_inner<Src>(&self, source: &Src) -> Result<usize, ImportError>
    where
        Src: ContactSource + Sync + ?Sized,
    {
        let records = source.fetch().await.map_err(ImportError::Fetch)?;

        let mut seen: HashSet<String> = match self.store.phones() {
            Ok(phones) => phones
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            Err(source) => return Err(ImportError::Store { inserted: 0, source }),
        };

        let mut inserted = 0usize;
        for record in &records {
            let mapped = map_record(record);
            let Some(phone) = mapped.phone else {
                continue;
            };
            if seen.contains(&phone) {
                continue;
            }
            let fields = ContactFields {
                name: mapped.name,
                phone: Some(phone.clone()),
                email: mapped.email,
            };
            if let Err(source) = self.store.insert(&fields, false, now_ms()) {
                return Err(ImportError::Store { inserted, source });
            }
            seen.insert(phone);
            inserted += 1;
        }

        match self.list() {
            Ok(_) => Ok(inserted),
            Err(source) => Err(ImportError::Refresh { inserted, source }),
        }
    }

    fn reload_after_write(&self) -> Result<(), MutationError> {
        match self.list() {
            Ok(_) => Ok(()),
            Err(err) => Err(MutationError::Refresh(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    use super::*;
    use crate::import::NO_NAME;
    use crate::store::SqliteStore;

    struct StaticSource {
        records: Vec<Value>,
    }

    #[async_trait]
    impl ContactSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
            Ok(self.records.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ContactSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
            let err = serde_json::from_str::<Value>("not json").unwrap_err();
            Err(FetchError::Decode(err))
        }
    }

    /// Store wrapper whose `list` can be made to fail on demand.
    struct FlakyStore {
        inner: SqliteStore,
        fail_list: AtomicBool,
    }

    impl FlakyStore {
        fn new(inner: SqliteStore) -> Self {
            Self {
                inner,
                fail_list: AtomicBool::new(false),
            }
        }
    }

    impl ContactStore for FlakyStore {
        fn list(&self) -> Result<Vec<Contact>, StoreError> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
            }
            self.inner.list()
        }

        fn insert(
            &self,
            fields: &ContactFields,
            favorite: bool,
            created_at: i64,
        ) -> Result<i64, StoreError> {
            self.inner.insert(fields, favorite, created_at)
        }

        fn update_fields(&self, id: i64, fields: &ContactFields) -> Result<usize, StoreError> {
            self.inner.update_fields(id, fields)
        }

        fn delete(&self, id: i64) -> Result<usize, StoreError> {
            self.inner.delete(id)
        }

        fn set_favorite(&self, id: i64, favorite: bool) -> Result<usize, StoreError> {
            self.inner.set_favorite(id, favorite)
        }

        fn phones(&self) -> Result<Vec<String>, StoreError> {
            self.inner.phones()
        }
    }

    fn empty_repo(dir: &tempfile::TempDir) -> ContactRepository<SqliteStore> {
        ContactRepository::new(SqliteStore::new(dir.path()))
    }

    #[test]
    fn add_trims_fields_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);

        repo.add("  Bob  ", Some("123"), None).unwrap();
        let contacts = repo.snapshot();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Bob");
        assert_eq!(contacts[0].phone.as_deref(), Some("123"));
        assert_eq!(contacts[0].email, None);
        assert!(!contacts[0].favorite);
        assert!(contacts[0].created_at > 0);
    }

    #[test]
    fn add_rejects_blank_name_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);

        let err = repo.add("   ", Some("123"), None).unwrap_err();
        assert!(matches!(err, MutationError::EmptyName));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn update_then_list_shows_new_fields_and_same_row() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("Bob", Some("123"), None).unwrap();
        let before = repo.snapshot().remove(0);

        repo.update(before.id, " Robert ", None, Some("r@example.com"))
            .unwrap();
        let after = repo.snapshot().remove(0);
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, "Robert");
        assert_eq!(after.phone, None);
        assert_eq!(after.email.as_deref(), Some("r@example.com"));
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.favorite, before.favorite);
    }

    #[test]
    fn update_on_missing_id_is_a_silent_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("Bob", None, None).unwrap();

        repo.update(999, "Nobody", None, None).unwrap();
        let contacts = repo.snapshot();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Bob");
    }

    #[test]
    fn delete_removes_the_row_from_later_listings() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("Bob", None, None).unwrap();
        let id = repo.snapshot()[0].id;

        repo.delete(id).unwrap();
        assert!(repo.snapshot().is_empty());
        repo.delete(id).unwrap(); // absent id is a no-op
    }

    #[test]
    fn toggle_flips_only_the_targeted_row() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("A", None, None).unwrap();
        repo.add("B", None, None).unwrap();
        let target = repo.snapshot()[0].clone();
        let other = repo.snapshot()[1].clone();

        repo.toggle_favorite(&target).unwrap();
        assert!(repo.find(target.id).unwrap().favorite);
        assert!(!repo.find(other.id).unwrap().favorite);
    }

    #[test]
    fn stale_toggle_overwrites_the_current_value() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("A", None, None).unwrap();
        let stale = repo.snapshot()[0].clone();
        assert!(!stale.favorite);

        repo.toggle_favorite(&stale).unwrap();
        assert!(repo.find(stale.id).unwrap().favorite);

        // toggling again with the stale copy flips back regardless of the
        // row's true current state
        repo.toggle_favorite(&stale).unwrap();
        assert!(!repo.find(stale.id).unwrap().favorite);
    }

    #[test]
    fn visible_applies_query_and_favorites_filter_without_store_access() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("Ada Lovelace", Some("+44 111"), None).unwrap();
        repo.add("Grace Hopper", Some("+1 222"), None).unwrap();
        let ada = repo.snapshot()[0].clone();
        repo.toggle_favorite(&ada).unwrap();

        repo.set_query("ada");
        assert_eq!(repo.visible().len(), 1);
        assert_eq!(repo.visible()[0].name, "Ada Lovelace");

        repo.set_query("222");
        assert_eq!(repo.visible()[0].name, "Grace Hopper");

        repo.set_query("");
        repo.set_favorites_only(true);
        let visible = repo.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Ada Lovelace");

        repo.set_favorites_only(false);
        assert_eq!(repo.visible().len(), 2);
    }

    #[test]
    fn refresh_failure_is_distinct_from_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlakyStore::new(SqliteStore::new(dir.path()));
        let repo = ContactRepository::new(store);

        repo.add("Bob", None, None).unwrap();

        repo.store.fail_list.store(true, Ordering::SeqCst);
        let err = repo.add("Zoe", None, None).unwrap_err();
        assert!(matches!(err, MutationError::Refresh(_)));

        // the write itself landed
        repo.store.fail_list.store(false, Ordering::SeqCst);
        let names: Vec<_> = repo.list().unwrap().into_iter().map(|c| c.name).collect();
        assert!(names.contains(&"Zoe".to_string()));
    }

    #[tokio::test]
    async fn import_deduplicates_by_phone_within_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        let source = StaticSource {
            records: vec![
                json!({ "name": "A", "phone": "1 2 3" }),
                json!({ "name": "B", "phone": "1 2 3" }),
            ],
        };

        let imported = repo.import(&source).await.unwrap();
        assert_eq!(imported, 1);
        let contacts = repo.snapshot();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "A");
        assert_eq!(contacts[0].phone.as_deref(), Some("123"));
        assert!(!contacts[0].favorite);
    }

    #[tokio::test]
    async fn import_skips_existing_phones_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        repo.add("Existing", Some("123"), None).unwrap();
        let source = StaticSource {
            records: vec![
                json!({ "name": "Dup", "phone": " 1 23" }),
                json!({ "name": "Fresh", "phone": "456" }),
            ],
        };

        assert_eq!(repo.import(&source).await.unwrap(), 1);
        assert_eq!(repo.import(&source).await.unwrap(), 0);
        assert_eq!(repo.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn import_never_inserts_phoneless_records() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        let source = StaticSource {
            records: vec![
                json!({ "name": "NoPhone" }),
                json!({ "name": "Blank", "phone": "   " }),
            ],
        };

        assert_eq!(repo.import(&source).await.unwrap(), 0);
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn import_substitutes_the_no_name_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);
        let source = StaticSource {
            records: vec![json!({ "phone": "789" })],
        };

        assert_eq!(repo.import(&source).await.unwrap(), 1);
        assert_eq!(repo.snapshot()[0].name, NO_NAME);
    }

    #[tokio::test]
    async fn import_surfaces_fetch_failures() {
        let dir = tempfile::tempdir().unwrap();
        let repo = empty_repo(&dir);

        let err = repo.import(&FailingSource).await.unwrap_err();
        assert!(matches!(err, ImportError::Fetch(_)));
        // a failed import releases the guard
        let source = StaticSource {
            records: vec![json!({ "name": "A", "phone": "1" })],
        };
        assert_eq!(repo.import(&source).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn import_refresh_failure_reports_inserted_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlakyStore::new(SqliteStore::new(dir.path()));
        let repo = ContactRepository::new(store);
        let source = StaticSource {
            records: vec![
                json!({ "name": "A", "phone": "1" }),
                json!({ "name": "B", "phone": "2" }),
            ],
        };

        repo.store.fail_list.store(true, Ordering::SeqCst);
        let err = repo.import(&source).await.unwrap_err();
        match err {
            ImportError::Refresh { inserted, .. } => assert_eq!(inserted, 2),
            other => panic!("expected refresh failure, got {other:?}"),
        }

        repo.store.fail_list.store(false, Ordering::SeqCst);
        assert_eq!(repo.list().unwrap().len(), 2);
    }

    struct GatedSource {
        started: Arc<Notify>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ContactSource for GatedSource {
        async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
            self.started.notify_one();
            self.gate.notified().await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn second_import_is_rejected_while_one_is_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(empty_repo(&dir));
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let source = Arc::new(GatedSource {
            started: started.clone(),
            gate: gate.clone(),
        });

        let first = tokio::spawn({
            let repo = repo.clone();
            let source = source.clone();
            async move { repo.import(source.as_ref()).await }
        });
        started.notified().await;

        let err = repo.import(source.as_ref()).await.unwrap_err();
        assert!(matches!(err, ImportError::Busy));

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), 0);
    }
}
