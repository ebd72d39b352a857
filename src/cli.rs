use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite database file (e.g., "academy.db")
    /// Can also be set using the DATABASE_PATH environment variable.
    /// Default value: academy.db
    #[arg(long, env = "DATABASE_PATH", default_value = "academy.db")]
    pub database_path: String,

    /// Database connection pool size
    /// Can also be set using the DB_POOL_MAX_SIZE environment variable.
    /// Default value: 10
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value = "10")]
    pub db_pool_max_size: u32,

    /// Server listen address and port (e.g., "127.0.0.1:3000")
    /// Can also be set using the SERVER_ADDRESS environment variable.
    /// Default value: 127.0.0.1:3000
    #[arg(long, env = "SERVER_ADDRESS", default_value = "127.0.0.1:3000")]
    pub server_address: SocketAddr,

    /// Directory where uploaded course resources are stored
    /// Can also be set using the RESOURCE_DIR environment variable.
    /// Default value: resources
    #[arg(long, env = "RESOURCE_DIR", default_value = "resources")]
    pub resource_dir: PathBuf,

    /// Create the database schema (and the default admin account) and exit
    /// without starting the server.
    #[arg(long, default_value_t = false)]
    pub init_only: bool,

    /// Log level (e.g., "info")
    /// Can also be set using the RUST_LOG environment variable.
    /// Default value: info
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
