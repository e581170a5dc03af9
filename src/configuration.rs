use std::net::SocketAddr;

use url::Url;

#[derive(Clone)]
pub struct Configuration {
    pub data_dir: String,
    pub import_url: Url,
    pub api_listen: SocketAddr,
    pub log_file: Option<String>,
    pub reset: bool,
}
