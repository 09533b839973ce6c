use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub struct Config {
    pub bind: SocketAddr,
    pub database_url: String,
    pub media_root: PathBuf,
}

impl Config {
    /// Reads configuration from the environment (a `.env` file is honored
    /// when present). Only `DATABASE_URL` is mandatory.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self {
            bind: try_load("BIND_ADDRESS", "127.0.0.1:8000"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            media_root: try_load("MEDIA_ROOT", "media"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| log::warn!("Invalid {key} value: {e}"))
        .expect("Environment misconfigured!")
}
