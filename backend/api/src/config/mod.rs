use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub smtp: SmtpConfig,
    pub storage: StorageConfig,
    pub admin_seed: AdminSeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,

    #[serde(default = "default_jwt_ttl_days")]
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins. "*" allows all origins.
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: String,

    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_smtp_from")]
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,

    /// Optional custom endpoint for S3-compatible providers.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Base URL public object URLs are assembled from.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    #[serde(default)]
    pub on_startup: bool,

    #[serde(default = "default_admin_email")]
    pub email: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_jwt_ttl_days() -> i64 {
    7
}

fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "VibeSync <noreply@vibesync.app>".to_string()
}

fn default_admin_email() -> String {
    "admin@gmail.com".to_string()
}

fn default_admin_password() -> String {
    "123456".to_string()
}

const MIN_JWT_SECRET_LEN: usize = 16;

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();

        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| default_app_port().to_string())
                .parse()
                .unwrap_or(default_app_port()),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| default_db_max_connections().to_string())
                .parse()
                .unwrap_or(default_db_max_connections()),
        };

        let secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        if secret.len() < MIN_JWT_SECRET_LEN {
            panic!("JWT_SECRET must be at least {} characters", MIN_JWT_SECRET_LEN);
        }
        let jwt = JwtConfig {
            secret,
            ttl_days: env::var("JWT_TTL_DAYS")
                .unwrap_or_else(|_| default_jwt_ttl_days().to_string())
                .parse()
                .unwrap_or(default_jwt_ttl_days()),
        };

        let cors: CorsConfig = envy::prefixed("CORS_").from_env()?;
        let smtp: SmtpConfig = envy::prefixed("SMTP_").from_env()?;
        let storage: StorageConfig = envy::prefixed("STORAGE_").from_env()?;

        let admin_seed = AdminSeedConfig {
            on_startup: env::var("SEED_ADMIN_ON_STARTUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| default_admin_email()),
            password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| default_admin_password()),
        };

        Ok(Config {
            app,
            database,
            jwt,
            cors,
            smtp,
            storage,
            admin_seed,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_app_env(), "development");
        assert_eq!(default_app_host(), "0.0.0.0");
        assert_eq!(default_app_port(), 8080);
        assert_eq!(default_db_max_connections(), 20);
        assert_eq!(default_jwt_ttl_days(), 7);
        assert_eq!(default_smtp_port(), 587);
        assert_eq!(default_admin_email(), "admin@gmail.com");
    }
}
