use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::AppError;

/// Where the trip and itinerary collections are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::Config(format!(
                "invalid STORAGE_BACKEND {other:?} (expected memory, file or sqlite)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub storage_backend: StorageBackend,
    pub data_root: PathBuf,
    pub database_url: String,
    pub seed_sample_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .map(|raw| raw.parse())
            .unwrap_or(Ok(StorageBackend::File))?;

        let data_root = env::var("DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://wanderlust.db".to_string());

        let seed_sample_data = match env::var("SEED_SAMPLE_DATA") {
            Ok(raw) => parse_flag(&raw)
                .ok_or_else(|| AppError::Config(format!("invalid SEED_SAMPLE_DATA: {raw:?}")))?,
            Err(_) => true,
        };

        Ok(Self {
            listen_addr,
            storage_backend,
            data_root,
            database_url,
            seed_sample_data,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
