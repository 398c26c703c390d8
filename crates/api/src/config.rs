//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// HS256 secret access tokens are signed with.
    pub access_token_secret: String,
    /// Timeout for the outbound request a user asks us to send.
    pub fetch_timeout: Duration,
    /// How long a rate-limit record is kept after its window started.
    pub rate_limit_retention: Duration,
    /// How often stale rate-limit records are pruned.
    pub rate_limit_sweep_every: Duration,
    /// Use `X-Forwarded-For` as the caller address.
    pub trust_forwarded_for: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PROBE_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:probe.db?mode=rwc` |
    /// | `ACCESS_TOKEN_SECRET` | Access token signing secret | (required) |
    /// | `FETCH_TIMEOUT_SECS` | Outbound request timeout | `30` |
    /// | `RATE_LIMIT_RETENTION_SECS` | Rate-limit record retention | `86400` |
    /// | `RATE_LIMIT_SWEEP_SECS` | Rate-limit sweep interval | `3600` |
    /// | `TRUST_FORWARDED_FOR` | Read caller IP from `X-Forwarded-For` | `false` |
    ///
    /// The analyst reads its own `OPENROUTER_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PROBE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:probe.db?mode=rwc".to_string());

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingAccessTokenSecret)?;

        Ok(Self {
            addr,
            database_url,
            access_token_secret,
            fetch_timeout: secs_var("FETCH_TIMEOUT_SECS", 30)?,
            rate_limit_retention: secs_var("RATE_LIMIT_RETENTION_SECS", 86_400)?,
            rate_limit_sweep_every: secs_var("RATE_LIMIT_SWEEP_SECS", 3_600)?,
            trust_forwarded_for: env::var("TRUST_FORWARDED_FOR")
                .map(|v| matches!(v.trim(), "1" | "true"))
                .unwrap_or(false),
        })
    }
}

fn secs_var(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidSeconds(name)),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PROBE_ADDR format")]
    InvalidAddr,

    #[error("ACCESS_TOKEN_SECRET environment variable is required")]
    MissingAccessTokenSecret,

    #[error("{0} must be a positive number of seconds")]
    InvalidSeconds(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 7] = [
        "PROBE_ADDR",
        "SQLITE_PATH",
        "ACCESS_TOKEN_SECRET",
        "FETCH_TIMEOUT_SECS",
        "RATE_LIMIT_RETENTION_SECS",
        "RATE_LIMIT_SWEEP_SECS",
        "TRUST_FORWARDED_FOR",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_and_required_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear();

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingAccessTokenSecret)
        ));

        env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr, "127.0.0.1:8790".parse().unwrap());
        assert_eq!(config.database_url, "sqlite:probe.db?mode=rwc");
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit_retention, Duration::from_secs(86_400));
        assert_eq!(config.rate_limit_sweep_every, Duration::from_secs(3_600));
        assert!(!config.trust_forwarded_for);
        clear();
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
        env::set_var("PROBE_ADDR", "0.0.0.0:9000");
        env::set_var("FETCH_TIMEOUT_SECS", "5");
        env::set_var("TRUST_FORWARDED_FOR", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert!(config.trust_forwarded_for);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));

        env::set_var("RATE_LIMIT_SWEEP_SECS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidSeconds("RATE_LIMIT_SWEEP_SECS"))
        ));

        env::set_var("PROBE_ADDR", "nope");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));
        clear();
    }
}
