use crate::constants::{
    CLIENT_DATA_DIR, DEFAULT_FACADE_ADDRESS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};
use clap::Parser;
use std::path::PathBuf;

/// Client daemon configuration: the façade's own listen address, and the
/// upstream server it keeps a persistent WebSocket link to.
#[derive(Debug, Clone, Parser)]
#[command(name = "client", about = "Verifiable file-storage client daemon")]
pub struct ClientConfig {
    /// Upstream server host.
    #[arg(long, env = "SERVER_HOST", default_value = DEFAULT_SERVER_HOST)]
    pub server_host: String,

    /// Upstream server port.
    #[arg(long, env = "SERVER_PORT", default_value = DEFAULT_SERVER_PORT)]
    pub server_port: u16,

    /// Local address the HTTP façade listens on.
    #[arg(long, default_value = DEFAULT_FACADE_ADDRESS)]
    pub listen: String,

    /// Directory holding the receipt -> root-hash store.
    #[arg(long, value_name = "DIR", default_value = CLIENT_DATA_DIR)]
    pub data_dir: PathBuf,
}

impl ClientConfig {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn server_url(&self) -> String {
        format!("ws://{}:{}/", self.server_host, self.server_port)
    }
}
