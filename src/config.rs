//! Runtime configuration: environment variables with code defaults.

use crate::pricing::FeeSchedule;

/// Engine configuration for one client profile.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace REST backend.
    pub backend_url: String,
    /// Path of the SQLite cart database.
    pub cart_db_path: String,
    /// Key isolating this profile's cart from others sharing the database.
    pub profile_key: String,
    pub fees: FeeSchedule,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = FeeSchedule::default();
        Self {
            backend_url: env_str("SERVEASE_BACKEND_URL", "http://localhost:8080"),
            cart_db_path: env_str("SERVEASE_CART_DB", "servease-cart.db"),
            profile_key: env_str("SERVEASE_PROFILE", "default"),
            fees: FeeSchedule {
                platform_fee: env_parsed("SERVEASE_PLATFORM_FEE", defaults.platform_fee),
                tax_rate: env_parsed("SERVEASE_TAX_RATE", defaults.tax_rate),
            },
        }
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
