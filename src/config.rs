use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub iamport: IamportConfig,
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS 白名单，留空则不限制
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://...` or `sqlite://path/to/file.db?mode=rwc`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamportConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// AES-256 key, exactly 32 bytes.
    pub aes_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the sweeps in-process. Turn off when an external orchestrator
    /// calls `POST /api/v1/admin/sweeps` instead.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_sweep_interval(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("failed to parse {config_path}: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        allowed_origins: Vec::new(),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    iamport: IamportConfig {
                        api_key: get_env("IAMPORT_KEY").unwrap_or_default(),
                        api_secret: get_env("IAMPORT_SECRET").unwrap_or_default(),
                        base_url: get_env("IAMPORT_BASE_URL")
                            .unwrap_or_else(|| "https://api.iamport.kr".to_string()),
                    },
                    crypto: CryptoConfig {
                        aes_key: get_env("AES_KEY").ok_or("AES_KEY is not set")?,
                    },
                    scheduler: SchedulerConfig {
                        enabled: get_env_parse("SCHEDULER_ENABLED", true),
                        interval_secs: get_env_parse("SCHEDULER_INTERVAL_SECS", 3600u64),
                    },
                }
            }
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            config.server.allowed_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("IAMPORT_KEY") {
            config.iamport.api_key = v;
        }
        if let Ok(v) = env::var("IAMPORT_SECRET") {
            config.iamport.api_secret = v;
        }
        if let Ok(v) = env::var("IAMPORT_BASE_URL") {
            config.iamport.base_url = v;
        }
        if let Ok(v) = env::var("AES_KEY") {
            config.crypto.aes_key = v;
        }
        if let Ok(v) = env::var("SCHEDULER_ENABLED")
            && let Ok(b) = v.parse()
        {
            config.scheduler.enabled = b;
        }
        if let Ok(v) = env::var("SCHEDULER_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.scheduler.interval_secs = n;
        }

        if config.crypto.aes_key.len() != 32 {
            return Err("AES_KEY must be exactly 32 bytes".into());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_with_default_scheduler() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite://choco.db?mode=rwc"
            max_connections = 5

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [iamport]
            api_key = "k"
            api_secret = "s"
            base_url = "https://api.iamport.kr"

            [crypto]
            aes_key = "0123456789abcdef0123456789abcdef"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.crypto.aes_key.len(), 32);
        assert!(config.server.allowed_origins.is_empty());
    }
}
