//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use cache::{RedisConfig, TokenSettings};
use tracing::warn;

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub redis_url: String,
    pub redis_connect_timeout_ms: u64,
    pub redis_command_timeout_ms: u64,
    pub redis_max_retries: u32,
    pub token_cooldown_hours: u64,
    pub scan_lock_seconds: u64,
    pub dedup_seconds: u64,
    pub session_default_minutes: i64,
    pub expiry_sweep_seconds: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "Malformed config value; using default");
        default
    })
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or malformed values fall back to development defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "qr-attendance".into()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "api=info,services=info,cache=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/attendance.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: var_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-in-production".into()),
            jwt_duration_minutes: var_or("JWT_DURATION_MINUTES", 60 * 24),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            redis_connect_timeout_ms: var_or("REDIS_CONNECT_TIMEOUT_MS", 15_000),
            redis_command_timeout_ms: var_or("REDIS_COMMAND_TIMEOUT_MS", 10_000),
            redis_max_retries: var_or("REDIS_MAX_RETRIES", 5),
            token_cooldown_hours: var_or("TOKEN_COOLDOWN_HOURS", 1),
            scan_lock_seconds: var_or("SCAN_LOCK_SECONDS", 10),
            dedup_seconds: var_or("DEDUP_SECONDS", 5),
            session_default_minutes: var_or("SESSION_DEFAULT_MINUTES", 5),
            expiry_sweep_seconds: var_or("EXPIRY_SWEEP_SECONDS", 60),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap_or_else(|p| p.into_inner());
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_redis_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.redis_url = value.into());
    }

    pub fn set_token_cooldown_hours(value: u64) {
        AppConfig::set_field(|cfg| cfg.token_cooldown_hours = value);
    }

    pub fn set_session_default_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.session_default_minutes = value);
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn redis_url() -> String {
    AppConfig::global().redis_url.clone()
}

pub fn redis_connect_timeout_ms() -> u64 {
    AppConfig::global().redis_connect_timeout_ms
}

pub fn redis_command_timeout_ms() -> u64 {
    AppConfig::global().redis_command_timeout_ms
}

pub fn redis_max_retries() -> u32 {
    AppConfig::global().redis_max_retries
}

pub fn token_cooldown_hours() -> u64 {
    AppConfig::global().token_cooldown_hours
}

pub fn scan_lock_seconds() -> u64 {
    AppConfig::global().scan_lock_seconds
}

pub fn dedup_seconds() -> u64 {
    AppConfig::global().dedup_seconds
}

/// Default session validity, clamped to the accepted 1..=1440 minute range.
pub fn session_default_minutes() -> i64 {
    AppConfig::global().session_default_minutes.clamp(1, 1440)
}

pub fn expiry_sweep_seconds() -> u64 {
    AppConfig::global().expiry_sweep_seconds.max(1)
}

pub fn token_settings() -> TokenSettings {
    let cfg = AppConfig::global();
    TokenSettings {
        cooldown: Duration::from_secs(cfg.token_cooldown_hours.max(1) * 60 * 60),
        scan_lock: Duration::from_secs(cfg.scan_lock_seconds.max(1)),
        dedup: Duration::from_secs(cfg.dedup_seconds.max(1)),
        ..TokenSettings::default()
    }
}

pub fn redis_config() -> RedisConfig {
    let cfg = AppConfig::global();
    RedisConfig {
        url: cfg.redis_url.clone(),
        connect_timeout: Duration::from_millis(cfg.redis_connect_timeout_ms),
        command_timeout: Duration::from_millis(cfg.redis_command_timeout_ms),
        max_retries: cfg.redis_max_retries,
    }
}
