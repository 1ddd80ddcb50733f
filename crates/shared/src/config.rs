//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Pagination limits for list endpoints.
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Whether the cookie carries the `Secure` attribute.
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            secure: false,
        }
    }
}

fn default_cookie_name() -> String {
    "shareslice_session".to_string()
}

fn default_session_ttl() -> u64 {
    86400 // 1 day
}

/// Pagination limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the client does not send one.
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
    /// Largest page size a client may request.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Later sources override earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `SHARESLICE__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SHARESLICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("config-test")),
                (
                    "SHARESLICE__DATABASE__URL",
                    Some("postgres://localhost/shareslice_test"),
                ),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/shareslice_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.session.cookie_name, "shareslice_session");
                assert_eq!(config.session.ttl_secs, 86400);
                assert!(!config.session.secure);
                assert_eq!(config.pagination.default_per_page, 20);
                assert_eq!(config.pagination.max_per_page, 100);
            },
        );
    }

    #[test]
    fn test_env_overrides_nested_values() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("config-test")),
                ("SHARESLICE__DATABASE__URL", Some("postgres://db/app")),
                ("SHARESLICE__SERVER__PORT", Some("9100")),
                ("SHARESLICE__SESSION__SECURE", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9100);
                assert!(config.session.secure);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("config-test")),
                ("SHARESLICE__DATABASE__URL", None::<&str>),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
