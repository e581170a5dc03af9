mod wiring;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

use crate::import::HttpSource;
use crate::repository::ContactRepository;
use crate::store::SqliteStore;
use crate::{cli, commands, context, rest};

pub struct App {
    pub ctx: context::Context,
    pub repository: Arc<ContactRepository<SqliteStore>>,
    pub source: Arc<HttpSource>,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli)?;

        crate::tracing::init(ctx.config.log_file.as_deref().map(Path::new));
        log::info!("🚀 Starting rolodex");
        log::info!("📂 Data dir: {}", ctx.config.data_dir);
        log::info!("📇 Import endpoint: {}", ctx.config.import_url);

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let store = wiring::init_store(&ctx)?;
        let repository = wiring::build_repository(store)?;
        let source = wiring::build_source(&ctx);

        Ok((
            Self {
                ctx,
                repository,
                source,
            },
            cli,
        ))
    }
}

pub async fn run_daemon(app: App, cli: cli::Cli) -> Result<()> {
    log::info!("🌐 REST API: http://{}", cli.api_listen);
    if let Some(path) = app.ctx.config.log_file.as_deref() {
        log::info!("📝 Log file: {}", path);
    }

    let shutdown = CancellationToken::new();
    let rest_shutdown = shutdown.clone();
    let repository = app.repository.clone();
    let source = app.source.clone();

    let mut rest_handle = tokio::spawn(async move {
        if let Err(e) = rest::serve(cli.api_listen, repository, source, rest_shutdown).await {
            log::error!("REST server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
            shutdown.cancel();
            if let Err(e) = (&mut rest_handle).await {
                log::error!("REST task error: {}", e);
            }
        }
        res = &mut rest_handle => {
            if let Err(e) = res {
                log::error!("REST task error: {}", e);
            }
        }
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        return commands::run(&app, cmd).await;
    }

    run_daemon(app, cli).await
}
