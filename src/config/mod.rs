use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gateway: GatewayConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which data gateway backend serves the resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    /// Managed backend over its REST interface
    #[default]
    Postgrest,
    /// Direct connection to a Postgres database
    Postgres,
    /// In-process tables, lost on exit
    Memory,
}

impl FromStr for GatewayBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgrest" | "supabase" | "rest" => Ok(Self::Postgrest),
            "postgres" | "postgresql" | "sql" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid {
                key: "GATEWAY_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// How callers are identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Every caller is treated as an admin
    #[default]
    Stub,
    /// Bearer tokens signed with the backend's JWT secret
    Jwt,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stub" | "none" | "always_admin" => Ok(Self::Stub),
            "jwt" => Ok(Self::Jwt),
            _ => Err(ConfigError::Invalid {
                key: "AUTH_MODE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub backend: GatewayBackend,
    /// Project URL of the managed backend
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub database_url: Option<String>,
    pub request_timeout_secs: u64,
    pub max_connections: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: GatewayBackend::default(),
            url: None,
            api_key: None,
            database_url: None,
            request_timeout_secs: 30,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub auth_mode: AuthMode,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    /// Same as [`AppConfig::load`], then validated
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self::load(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Environment defaults with overrides read through `source`, not yet validated
    pub fn load(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let get = |key: &str| source(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&get)
    }

    fn with_overrides(mut self, get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Gateway overrides
        if let Some(v) = get("GATEWAY_BACKEND") {
            self.gateway.backend = v.parse()?;
        }
        self.gateway.url = get("SUPABASE_URL").or_else(|| get("NEXT_PUBLIC_SUPABASE_URL"));
        self.gateway.api_key = get("SUPABASE_SERVICE_ROLE_KEY").or_else(|| get("SUPABASE_ANON_KEY"));
        self.gateway.database_url = get("DATABASE_URL");
        if let Some(v) = get("GATEWAY_REQUEST_TIMEOUT_SECS") {
            self.gateway.request_timeout_secs = v.parse().unwrap_or(self.gateway.request_timeout_secs);
        }
        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            self.gateway.max_connections = v.parse().unwrap_or(self.gateway.max_connections);
        }

        // API overrides
        if let Some(v) = get("API_PORT").or_else(|| get("PORT")) {
            self.api.port = v.parse().map_err(|_| ConfigError::Invalid {
                key: "API_PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = get("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = get("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = get("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = get("AUTH_MODE") {
            self.security.auth_mode = v.parse()?;
        }
        self.security.jwt_secret = get("SUPABASE_JWT_SECRET");

        Ok(self)
    }

    /// Fail fast on settings the selected backends cannot start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.gateway.backend {
            GatewayBackend::Postgrest => {
                if self.gateway.url.is_none() {
                    return Err(ConfigError::Missing("SUPABASE_URL"));
                }
                if self.gateway.api_key.is_none() {
                    return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
                }
            }
            GatewayBackend::Postgres => {
                if self.gateway.database_url.is_none() {
                    return Err(ConfigError::Missing("DATABASE_URL"));
                }
            }
            GatewayBackend::Memory => {}
        }

        if self.security.auth_mode == AuthMode::Jwt && self.security.jwt_secret.is_none() {
            return Err(ConfigError::Missing("SUPABASE_JWT_SECRET"));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            gateway: GatewayConfig {
                request_timeout_secs: 30,
                max_connections: 10,
                ..GatewayConfig::default()
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                auth_mode: AuthMode::Stub,
                jwt_secret: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gateway: GatewayConfig {
                request_timeout_secs: 15,
                max_connections: 20,
                ..GatewayConfig::default()
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                auth_mode: AuthMode::Stub,
                jwt_secret: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            gateway: GatewayConfig {
                request_timeout_secs: 10,
                max_connections: 50,
                ..GatewayConfig::default()
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                auth_mode: AuthMode::Stub,
                jwt_secret: None,
            },
        }
    }
}
