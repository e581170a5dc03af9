use anyhow::{Context as AnyhowContext, Result};
use url::Url;

use crate::configuration::Configuration;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let import_url = Url::parse(&cli.import_url)
            .with_context(|| format!("invalid import url: {}", cli.import_url))?;
        let config = Configuration {
            data_dir: cli.data_dir.clone(),
            import_url,
            api_listen: cli.api_listen,
            log_file: cli.log_file.clone(),
            reset: cli.reset,
        };
        Ok(Self { config })
    }
}
