/*!
 * Application Configuration
 * Everything the server reads from the environment, loaded once at startup
 */
use std::env;

use crate::db::DbConfig;

/// Secret used when `JWT_SECRET` is not set. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureJwtSecret,
    #[error("Invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Credentials for the admin account created at startup, if configured.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
    /// `None` runs the server against the in-memory store.
    pub database: Option<DbConfig>,
    pub allowed_origins: Vec<String>,
    pub log_level: Option<String>,
    pub log_dir: String,
    pub admin_seed: Option<AdminSeed>,
    /// Seed sample projects and a welcome post under the admin account.
    pub seed_sample_content: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            database: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            log_level: None,
            log_dir: "logs".to_string(),
            admin_seed: None,
            seed_sample_content: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
                name: "PORT",
                value,
            })?,
            Err(_) => defaults.port,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(value) => match value.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(ConfigError::InvalidVar { name: "BCRYPT_COST", value }),
            },
            Err(_) => defaults.bcrypt_cost,
        };

        let database = env::var("DATABASE_URL").ok().map(|_| DbConfig::default());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| env::var("FRONTEND_ORIGIN").ok().map(|origin| vec![origin]))
            .unwrap_or(defaults.allowed_origins);

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    email,
                    password,
                    display_name: env::var("ADMIN_DISPLAY_NAME")
                        .unwrap_or_else(|_| "Administrator".to_string()),
                })
            }
            _ => None,
        };

        let config = Self {
            environment,
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            jwt_secret,
            token_ttl_days: defaults.token_ttl_days,
            bcrypt_cost,
            database,
            allowed_origins,
            log_level: env::var("LOG_LEVEL").ok(),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            admin_seed,
            seed_sample_content: env::var("SEED_SAMPLE_CONTENT")
                .map(|v| matches!(v.trim(), "true" | "1"))
                .unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Refuse to run in production with the insecure default JWT secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production()
            && (self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET)
        {
            return Err(ConfigError::InsecureJwtSecret);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_development() {
        let config = AppConfig::default();
        assert!(!config.is_production());
        assert_eq!(config.token_ttl_days, 7);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureJwtSecret)
        ));
    }

    #[test]
    fn test_production_accepts_custom_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            jwt_secret: "a-long-and-unique-production-secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
