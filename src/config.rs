use std::env;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CHAIN_FILE: &str = "blockchain.json";

/// Process settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chain_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let chain_file = lookup("CHAIN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHAIN_FILE));

        Self {
            host,
            port,
            chain_file,
        }
    }
}
