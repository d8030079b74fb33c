// config.rs
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use chrono::Duration;

use crate::errors::{AppError, Result};

/// Knobs for the password-reset flow.
#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub code_length: usize,
    pub code_ttl: Duration,
    /// How long a verified challenge stays committable after `expires_at`.
    pub reset_window: Duration,
    /// `None` keeps unlimited retries.
    pub max_attempts: Option<u32>,
    pub min_password_length: usize,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            code_length: 6,
            code_ttl: Duration::minutes(10),
            reset_window: Duration::minutes(10),
            max_attempts: None,
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub purge_interval_secs: u64,
    pub log_level: tracing::Level,
    pub reset: ResetPolicy,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key)
                .map(str::to_string)
                .ok_or_else(|| AppError::configuration(format!("{} must be set", key)))
        };

        let code_length: usize = parse_or(get("OTP_LENGTH"), "OTP_LENGTH", 6)?;
        if !(4..=10).contains(&code_length) {
            return Err(AppError::configuration("OTP_LENGTH must be between 4 and 10"));
        }

        let max_attempts = match get("OTP_MAX_ATTEMPTS") {
            Some(raw) => {
                let n: u32 = parse_value(raw, "OTP_MAX_ATTEMPTS")?;
                if n == 0 {
                    return Err(AppError::configuration("OTP_MAX_ATTEMPTS must be positive"));
                }
                Some(n)
            }
            None => None,
        };

        let ttl_minutes = positive(
            parse_or(get("OTP_TTL_MINUTES"), "OTP_TTL_MINUTES", 10)?,
            "OTP_TTL_MINUTES",
        )?;
        let window_minutes: i64 =
            parse_or(get("OTP_RESET_WINDOW_MINUTES"), "OTP_RESET_WINDOW_MINUTES", 10)?;
        if window_minutes < 0 {
            return Err(AppError::configuration(
                "OTP_RESET_WINDOW_MINUTES must not be negative",
            ));
        }

        let reset = ResetPolicy {
            code_length,
            code_ttl: minutes(ttl_minutes, "OTP_TTL_MINUTES")?,
            reset_window: minutes(window_minutes, "OTP_RESET_WINDOW_MINUTES")?,
            max_attempts,
            min_password_length: parse_or(get("MIN_PASSWORD_LENGTH"), "MIN_PASSWORD_LENGTH", 6)?,
        };

        let bcrypt_cost: u32 = parse_or(get("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AppError::configuration("BCRYPT_COST must be between 4 and 31"));
        }

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => tracing::Level::from_str(raw)
                .map_err(|_| AppError::configuration(format!("LOG_LEVEL '{}' is not a level", raw)))?,
            None => tracing::Level::INFO,
        };

        Ok(AppConfig {
            database_url: require("DATABASE_URL")?,
            database_name: get("DATABASE_NAME").unwrap_or("storefront").to_string(),
            host: get("HOST").unwrap_or("0.0.0.0").to_string(),
            port: parse_or(get("PORT"), "PORT", 5000)?,
            jwt_secret: require("JWT_SECRET")?,
            bcrypt_cost,
            purge_interval_secs: positive(
                parse_or(get("OTP_PURGE_INTERVAL_SECS"), "OTP_PURGE_INTERVAL_SECS", 300)?,
                "OTP_PURGE_INTERVAL_SECS",
            )?,
            log_level,
            reset,
            mail: MailConfig {
                api_url: get("MAIL_API_URL").map(str::to_string),
                api_key: get("MAIL_API_KEY").unwrap_or_default().to_string(),
                from: get("MAIL_FROM").unwrap_or("no-reply@storefront.local").to_string(),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "database_name": self.database_name,
            "bind": self.bind_addr(),
            "otp_length": self.reset.code_length,
            "otp_ttl_minutes": self.reset.code_ttl.num_minutes(),
            "otp_max_attempts": self.reset.max_attempts,
            "reset_window_minutes": self.reset.reset_window.num_minutes(),
            "mail_api_configured": self.mail.api_url.is_some(),
        })
    }
}

fn parse_value<T: FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AppError::configuration(format!("{} has invalid value '{}'", key, raw)))
}

fn parse_or<T: FromStr>(raw: Option<&str>, key: &str, default: T) -> Result<T> {
    raw.map(|v| parse_value(v, key)).unwrap_or(Ok(default))
}

/// Reset durations are capped at one week.
const MAX_MINUTES: i64 = 7 * 24 * 60;

fn minutes(value: i64, key: &str) -> Result<Duration> {
    if value > MAX_MINUTES {
        return Err(AppError::configuration(format!(
            "{} must be at most {} minutes",
            key, MAX_MINUTES
        )));
    }
    Duration::try_minutes(value)
        .ok_or_else(|| AppError::configuration(format!("{} is out of range", key)))
}

fn positive<T: PartialOrd + Default>(value: T, key: &str) -> Result<T> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(AppError::configuration(format!("{} must be positive", key)))
    }
}
