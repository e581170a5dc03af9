mod app;
mod cli;
mod commands;
mod configuration;
mod context;
mod import;
mod repository;
mod rest;
mod store;
mod tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
