use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};

use crate::commands::bootstrap_admin::BootstrapAdminCmd;

#[derive(Parser, Debug)]
#[command(
    name = "kino-cli",
    about = "Management commands for the movie catalog backend"
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Ensure the administrative account exists, creating it if needed")]
    BootstrapAdmin(BootstrapAdminCmd),
}

#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "KINO_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db or similar, default is sqlite://[data-dir]/kino.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "KINO_DATA_DIR",
        help = "Data directory (database, configs etc.), default is system default like ~/.local/share/kino",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("kino"))
        .unwrap_or_else(|| PathBuf::from("kino"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/kino.db", self.data_dir))
    }
}
