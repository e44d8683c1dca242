//! Application configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_CHARSET`
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
//! - `CLOUDINARY_UPLOAD_FOLDER` (default: blog_stories)
//! - `SECRET_KEY`, `DEBUG`
//!
//! No secret has a default value. A missing `DB_PASSWORD` means the store
//! is contacted without a password.

use std::fmt;

use sqlx::mysql::MySqlConnectOptions;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Store endpoint configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub charset: String,
}

impl DatabaseConfig {
    /// Connect options targeting the configured schema.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        self.server_options().database(&self.database)
    }

    /// Connect options for the server only, without selecting a schema.
    pub fn server_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .charset(&self.charset);

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "blog_website".to_string(),
            charset: "utf8mb4".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redacted(&self.password))
            .field("database", &self.database)
            .field("charset", &self.charset)
            .finish()
    }
}

/// Image host credentials and destination folder
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_folder: String,
}

impl CloudinaryConfig {
    /// Names of the credential variables that are unset or empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("CLOUDINARY_CLOUD_NAME", &self.cloud_name),
            ("CLOUDINARY_API_KEY", &self.api_key),
            ("CLOUDINARY_API_SECRET", &self.api_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(var, _)| var)
        .collect()
    }
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            upload_folder: "blog_stories".to_string(),
        }
    }
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("upload_folder", &self.upload_folder)
            .finish()
    }
}

/// Complete application configuration
#[derive(Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cloudinary: CloudinaryConfig,
    pub secret_key: Option<String>,
    pub debug: bool,
}

impl AppConfig {
    /// Create config from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DatabaseConfig::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: "DB_PORT",
                value: raw.clone(),
                reason: "expected a port number",
            })?,
            None => defaults.port,
        };

        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or(defaults.host),
            port,
            user: get("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD").filter(|v| !v.is_empty()),
            database: get("DB_NAME").unwrap_or(defaults.database),
            charset: get("DB_CHARSET").unwrap_or(defaults.charset),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: get("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: get("CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: get("CLOUDINARY_API_SECRET").unwrap_or_default(),
            upload_folder: get("CLOUDINARY_UPLOAD_FOLDER")
                .unwrap_or_else(|| CloudinaryConfig::default().upload_folder),
        };

        let debug = match get("DEBUG") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                var: "DEBUG",
                value: raw.clone(),
                reason: "expected true/false",
            })?,
            None => false,
        };

        Ok(Self {
            database,
            cloudinary,
            secret_key: get("SECRET_KEY"),
            debug,
        })
    }

    /// Log warnings for settings that leave features degraded.
    pub fn warn_on_gaps(&self) {
        let missing = self.cloudinary.missing_credentials();
        if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.join(", "),
                "Cloudinary credentials missing, image uploads will fail"
            );
        }
        if self.secret_key.is_none() {
            tracing::warn!("SECRET_KEY is not set");
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database)
            .field("cloudinary", &self.cloudinary)
            .field("secret_key", &redacted(&self.secret_key))
            .field("debug", &self.debug)
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.user, "root");
        assert_eq!(config.database.database, "blog_website");
        assert_eq!(config.database.charset, "utf8mb4");
        assert!(config.database.password.is_none());
        assert!(config.secret_key.is_none());
        assert_eq!(config.cloudinary.upload_folder, "blog_stories");
        assert!(!config.debug);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "stories"),
            ("CLOUDINARY_UPLOAD_FOLDER", "uploads"),
            ("DEBUG", "True"),
        ])
        .unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.password.as_deref(), Some("hunter2"));
        assert_eq!(config.database.database, "stories");
        assert_eq!(config.cloudinary.upload_folder, "uploads");
        assert!(config.debug);
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("DB_PORT", "mysql")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn rejects_bad_debug_flag() {
        assert!(config_from(&[("DEBUG", "maybe")]).is_err());
    }

    #[test]
    fn reports_missing_cloudinary_credentials() {
        let config = config_from(&[("CLOUDINARY_API_KEY", "key")]).unwrap();
        assert_eq!(
            config.cloudinary.missing_credentials(),
            vec!["CLOUDINARY_CLOUD_NAME", "CLOUDINARY_API_SECRET"]
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config_from(&[
            ("DB_PASSWORD", "hunter2"),
            ("SECRET_KEY", "s3cret"),
            ("CLOUDINARY_API_SECRET", "cloudy"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("cloudy"));
    }
}
