use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;
use std::path::PathBuf;

/// Server configuration, loaded command-line args > environment variables >
/// defaults (clap resolves this priority natively via `env`).
#[derive(Debug, Clone, Parser)]
#[command(name = "server", about = "Verifiable file-storage server")]
pub struct ServerConfig {
    /// Listen host.
    #[arg(long, env = "SERVER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Listen port.
    #[arg(long, env = "PORT", default_value = DEFAULT_PORT)]
    pub port: u16,

    /// Root directory for the blob store and the sled tree store.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,
}

impl ServerConfig {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("downloads")
    }

    pub fn tree_db_dir(&self) -> PathBuf {
        self.data_dir.join("db")
    }
}
