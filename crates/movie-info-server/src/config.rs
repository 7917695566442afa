use core::panic;
use std::{fs, path::PathBuf};

use crate::error::Result;
pub use clap::Parser;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 8080,
        env = "MOVIE_INFO_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,

    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "MOVIE_INFO_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "MOVIE_INFO_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db or similar, default is sqlite://[data-dir]/movie-info.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "MOVIE_INFO_DATA_DIR",
        help = "Data directory (database etc.), default is system default like ~/.local/share/movie-info",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("movie-info"))
        .unwrap_or_else(|| PathBuf::from("movie-info"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/movie-info.db?mode=rwc", self.data_dir))
    }
}
