use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub loadgen: LoadGenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 10,
            body_limit_bytes: 64 * 1024,
            enable_cors: false,
        }
    }
}

/// Where the classifier parameters come from.
///
/// Without a path the artifact embedded at build time is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: Option<String>,
}

/// Load generator settings. Wait times are in seconds and drawn uniformly
/// from `[min_wait_secs, max_wait_secs]` before every request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_wait_interval"))]
pub struct LoadGenConfig {
    #[validate(length(min = 1))]
    pub base_url: String,
    #[validate(range(min = 1))]
    pub users: usize,
    /// Users started per second
    #[validate(range(exclusive_min = 0.0))]
    pub spawn_rate: f64,
    #[validate(range(min = 0.0))]
    pub min_wait_secs: f64,
    #[validate(range(min = 0.0))]
    pub max_wait_secs: f64,
    /// Zero runs until ctrl-c
    pub run_time_secs: u64,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    pub seed: Option<u64>,
}

impl Default for LoadGenConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            users: 10,
            spawn_rate: 1.0,
            min_wait_secs: 1.0,
            max_wait_secs: 5.0,
            run_time_secs: 60,
            request_timeout_secs: 10,
            seed: None,
        }
    }
}

fn validate_wait_interval(cfg: &LoadGenConfig) -> Result<(), ValidationError> {
    if cfg.min_wait_secs > cfg.max_wait_secs {
        return Err(ValidationError::new("min_wait_exceeds_max_wait"));
    }
    Ok(())
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PENGUIN__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.loadgen.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.loadgen.validate().is_ok());
        assert_eq!(cfg.loadgen.min_wait_secs, 1.0);
        assert_eq!(cfg.loadgen.max_wait_secs, 5.0);
        assert!(cfg.model.path.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        let addr = server.socket_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_inverted_wait_interval_rejected() {
        let cfg = LoadGenConfig {
            min_wait_secs: 5.0,
            max_wait_secs: 1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_users_rejected() {
        let cfg = LoadGenConfig {
            users: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            [server]
            port = 9100

            [loadgen]
            users = 3
            min_wait_secs = 0.5
            max_wait_secs = 0.5
            "#,
        ));
        let cfg = Config::from_figment(figment).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.loadgen.users, 3);
        assert_eq!(cfg.loadgen.min_wait_secs, 0.5);
    }

    #[test]
    fn test_env_overrides_config_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/default.toml",
                r#"
                [server]
                port = 9100

                [loadgen]
                users = 4
                "#,
            )?;
            jail.set_env("PENGUIN__SERVER__PORT", 9001);
            jail.set_env("PENGUIN__LOADGEN__MIN_WAIT_SECS", 0.5);

            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.server.port, 9001);
            assert_eq!(cfg.loadgen.min_wait_secs, 0.5);
            assert_eq!(cfg.loadgen.users, 4);
            assert_eq!(cfg.loadgen.max_wait_secs, 5.0);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_override_fails_load() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PENGUIN__LOADGEN__MIN_WAIT_SECS", 9.0);
            assert!(Config::load().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_loadgen_section_fails_load() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            [loadgen]
            min_wait_secs = 10.0
            max_wait_secs = 2.0
            "#,
        ));
        assert!(Config::from_figment(figment).is_err());
    }
}
