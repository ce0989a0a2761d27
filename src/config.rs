//! Server settings read from the environment.
//!
//! Auth settings (`SECRET_KEY`, `AUTH_SERVICE_URL`) live in
//! `pushkind_common::models::config::CommonServerConfig` and are read in `main`.

use std::env;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "app.db";
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DOMAIN: &str = "localhost";
const DEFAULT_PERMISSION_REFRESH_SECS: u64 = 30;
const DEFAULT_EXPIRY_WARNING_DAYS: u64 = 7;

/// Inventory specific settings. Malformed values fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Cookie domain without the leading dot.
    pub domain: String,
    /// How often stored permission rules are re-read and published.
    pub permission_refresh_secs: u64,
    /// Batches expiring within this many days are flagged.
    pub expiry_warning_days: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            domain: DEFAULT_DOMAIN.to_string(),
            permission_refresh_secs: DEFAULT_PERMISSION_REFRESH_SECS,
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}

impl InventoryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            address: lookup("ADDRESS").unwrap_or(defaults.address),
            port: parsed(&lookup, "PORT", defaults.port),
            domain: lookup("DOMAIN").unwrap_or(defaults.domain),
            permission_refresh_secs: parsed(
                &lookup,
                "PERMISSION_REFRESH_SECS",
                defaults.permission_refresh_secs,
            )
            .max(1),
            expiry_warning_days: parsed(
                &lookup,
                "EXPIRY_WARNING_DAYS",
                defaults.expiry_warning_days,
            ),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed {key}={raw}");
            default
        }),
        None => default,
    }
}
