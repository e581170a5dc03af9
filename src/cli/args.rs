use clap::Parser;
use std::env;

use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Local-first contacts manager with a REST API and remote import",
    long_about = "Keeps a contact list in a local SQLite database, serves it over a small REST API, and can merge contacts from a remote JSON endpoint with phone-number deduplication.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        env = "ROLODEX_DATA_DIR",
        default_value = ".rolodex/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "import-url",
        env = "ROLODEX_IMPORT_URL",
        default_value = "https://jsonplaceholder.typicode.com/users",
        value_name = "URL",
        help = "Remote JSON endpoint used by import when no explicit URL is given"
    )]
    pub import_url: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Delete the SQLite database before starting"
    )]
    pub reset: bool,

    #[arg(
        long = "log-file",
        env = "ROLODEX_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "ROLODEX_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8087",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();
    Cli::parse()
}
