use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub db_max_connections: u32,
    pub db_retry_delay_ms: u64,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 24);
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);
        let db_retry_delay_ms = parse_or("DB_RETRY_DELAY_MS", 500);
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_default();

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours,
            db_max_connections,
            db_retry_delay_ms,
            cors_origins,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = split_origins(" http://localhost:3000, ,https://shop.example.com ");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://shop.example.com"]
        );
    }

    #[test]
    fn empty_origin_list_means_any() {
        assert!(split_origins("").is_empty());
    }
}
