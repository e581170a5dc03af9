use std::sync::Arc;

use anyhow::{Context, Result};

use crate::context;
use crate::import::HttpSource;
use crate::repository::ContactRepository;
use crate::store::SqliteStore;

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.config.data_dir)?;
    Ok(())
}

pub fn init_store(ctx: &context::Context) -> Result<SqliteStore> {
    let store = SqliteStore::new(&ctx.config.data_dir);
    if ctx.config.reset {
        store.reset_all().context("resetting store")?;
    }
    store.init().context("initializing store")?;
    Ok(store)
}

pub fn build_repository(store: SqliteStore) -> Result<Arc<ContactRepository<SqliteStore>>> {
    let repository = ContactRepository::new(store);
    repository.list().context("loading contacts")?;
    Ok(Arc::new(repository))
}

pub fn build_source(ctx: &context::Context) -> Arc<HttpSource> {
    Arc::new(HttpSource::new(ctx.config.import_url.clone()))
}
