use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub api_base: String,
    pub image_base: String,
    pub storage_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = get("TMDB_ACCESS_TOKEN")
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_ACCESS_TOKEN"))?;
        let api_base = get("TMDB_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let image_base = get("TMDB_IMAGE_BASE")
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let storage_dir = match get("CINEPICK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_storage_dir()?,
        };
        let bind = get("CINEPICK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("CINEPICK_BIND is not a socket address: {}", bind))?;

        Ok(Self {
            access_token,
            api_base,
            image_base,
            storage_dir,
            bind_addr,
        })
    }
}

fn default_storage_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "cinepick", "cinepick")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory; set CINEPICK_DATA_DIR"))
}
