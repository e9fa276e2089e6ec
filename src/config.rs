use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub redis_url: String,
    pub signing_secret: String,
    pub join_token_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub default_world_capacity: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            signing_secret: env::var("SIGNING_SECRET")
                .map_err(|_| ConfigError::MissingSigningSecret)?,
            join_token_ttl_seconds: env::var("JOIN_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),
            default_world_capacity: env::var("DEFAULT_WORLD_CAPACITY")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .unwrap_or(32),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("SIGNING_SECRET environment variable is required")]
    MissingSigningSecret,
}
