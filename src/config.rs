use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints_file: PathBuf,
    pub public_base_url: String,
    /// False when `PUBLIC_BASE_URL` was not set and the localhost fallback is in use
    pub base_url_configured: bool,
    pub notice_ttl: Duration,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let endpoints_file = env::var("ENDPOINTS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("endpoints.json"));

        let (public_base_url, base_url_configured) = match env::var("PUBLIC_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => (url.trim().to_string(), true),
            _ => (DEFAULT_BASE_URL.to_string(), false),
        };

        let notice_ttl_secs = env::var("NOTICE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .context("NOTICE_TTL_SECS must be a whole number of seconds")?;

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            endpoints_file,
            public_base_url,
            base_url_configured,
            notice_ttl: Duration::from_secs(notice_ttl_secs),
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Endpoints file: {}", self.endpoints_file.display());
        tracing::info!("  Public base URL: {}", self.public_base_url);
        tracing::info!("  Notice TTL: {}s", self.notice_ttl.as_secs());
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);

        if !self.base_url_configured {
            tracing::warn!(
                "PUBLIC_BASE_URL is not set; endpoint URLs shown in the management view will use {}",
                DEFAULT_BASE_URL
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide env vars.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env_vars() {
        unsafe {
            env::remove_var("ENDPOINTS_FILE");
            env::remove_var("PUBLIC_BASE_URL");
            env::remove_var("NOTICE_TTL_SECS");
            env::remove_var("SERVICE_PORT");
            env::remove_var("SERVICE_HOST");
        }
    }

    #[test]
    fn test_config_with_all_vars() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("ENDPOINTS_FILE", "/var/lib/endpoints/data.json");
            env::set_var("PUBLIC_BASE_URL", "https://hooks.example.com");
            env::set_var("NOTICE_TTL_SECS", "30");
            env::set_var("SERVICE_PORT", "8080");
            env::set_var("SERVICE_HOST", "127.0.0.1");
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.endpoints_file, PathBuf::from("/var/lib/endpoints/data.json"));
        assert_eq!(config.public_base_url, "https://hooks.example.com");
        assert!(config.base_url_configured);
        assert_eq!(config.notice_ttl, Duration::from_secs(30));
        assert_eq!(config.service_port, 8080);
        assert_eq!(config.service_host, "127.0.0.1");
        clear_env_vars();
    }

    #[test]
    fn test_config_with_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let config = Config::from_env().unwrap();

        assert_eq!(config.endpoints_file, PathBuf::from("endpoints.json"));
        assert_eq!(config.public_base_url, DEFAULT_BASE_URL);
        assert!(!config.base_url_configured);
        assert_eq!(config.notice_ttl, Duration::from_secs(300));
        assert_eq!(config.service_port, 3000);
        assert_eq!(config.service_host, "0.0.0.0");
    }

    #[test]
    fn test_blank_base_url_falls_back() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("PUBLIC_BASE_URL", "   ");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.public_base_url, DEFAULT_BASE_URL);
        assert!(!config.base_url_configured);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_port() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("SERVICE_PORT", "not-a-number");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.to_string().contains("SERVICE_PORT"));
        clear_env_vars();
    }

    #[test]
    fn test_port_out_of_range() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("SERVICE_PORT", "99999");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        clear_env_vars();
    }

    #[test]
    fn test_invalid_notice_ttl() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("NOTICE_TTL_SECS", "soon");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("NOTICE_TTL_SECS"));
        clear_env_vars();
    }
}
