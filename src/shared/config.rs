use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub records_path: String,
    pub health_path: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound on the local database size. `None` leaves SQLite unbounded.
    #[serde(default)]
    pub max_queue_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name_prefix: String,
    /// Bumped on every deploy; namespaces from older versions are purged on activation.
    pub version: String,
    pub app_origin: String,
    pub precache_paths: Vec<String>,
    pub shell_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub interval_secs: u64,
    pub stuck_after_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub check_interval_secs: u64,
    pub assume_online: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost/field-maintenance/php".to_string(),
                records_path: "/records".to_string(),
                health_path: "/health".to_string(),
                request_timeout_ms: 10_000,
            },
            storage: StorageConfig {
                database_url: default_database_url(),
                max_connections: 5,
                max_queue_bytes: None,
            },
            cache: CacheConfig {
                name_prefix: "field-maintenance".to_string(),
                version: "v1.0.0".to_string(),
                app_origin: "http://localhost:5173".to_string(),
                precache_paths: vec![
                    "/".to_string(),
                    "/index.html".to_string(),
                    "/manifest.json".to_string(),
                ],
                shell_path: "/index.html".to_string(),
            },
            sync: SyncConfig {
                auto_sync: true,
                interval_secs: 300, // 5 minutes
                stuck_after_attempts: 5,
            },
            connectivity: ConnectivityConfig {
                check_interval_secs: 30,
                assume_online: true,
            },
        }
    }
}

impl ApiConfig {
    pub fn records_url(&self) -> String {
        join_url(&self.base_url, &self.records_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }
}

impl CacheConfig {
    pub fn shell_url(&self) -> String {
        join_url(&self.app_origin, &self.shell_path)
    }

    pub fn precache_urls(&self) -> Vec<String> {
        self.precache_paths
            .iter()
            .map(|path| join_url(&self.app_origin, path))
            .collect()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FIELD_SYNC_API_BASE_URL") {
            if !v.trim().is_empty() {
                cfg.api.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELD_SYNC_RECORDS_PATH") {
            cfg.api.records_path = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("FIELD_SYNC_HEALTH_PATH") {
            cfg.api.health_path = v.trim().to_string();
        }
        if let Some(value) = env_u64("FIELD_SYNC_REQUEST_TIMEOUT_MS") {
            cfg.api.request_timeout_ms = value.max(1);
        }

        if let Ok(v) = std::env::var("FIELD_SYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.storage.database_url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("FIELD_SYNC_MAX_CONNECTIONS") {
            cfg.storage.max_connections = value.clamp(1, u32::MAX as u64) as u32;
        }
        if let Some(value) = env_u64("FIELD_SYNC_MAX_QUEUE_BYTES") {
            cfg.storage.max_queue_bytes = if value == 0 { None } else { Some(value) };
        }

        if let Ok(v) = std::env::var("FIELD_SYNC_CACHE_VERSION") {
            if !v.trim().is_empty() {
                cfg.cache.version = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELD_SYNC_APP_ORIGIN") {
            if !v.trim().is_empty() {
                cfg.cache.app_origin = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELD_SYNC_PRECACHE_PATHS") {
            cfg.cache.precache_paths = parse_list(&v);
        }

        if let Ok(v) = std::env::var("FIELD_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("FIELD_SYNC_INTERVAL_SECS") {
            cfg.sync.interval_secs = value;
        }
        if let Some(value) = env_u64("FIELD_SYNC_STUCK_AFTER_ATTEMPTS") {
            cfg.sync.stuck_after_attempts = value.clamp(1, u32::MAX as u64) as u32;
        }

        if let Some(value) = env_u64("FIELD_SYNC_CHECK_INTERVAL_SECS") {
            cfg.connectivity.check_interval_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("FIELD_SYNC_ASSUME_ONLINE") {
            cfg.connectivity.assume_online = parse_bool(&v, cfg.connectivity.assume_online);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err("API base_url must be an http(s) URL".to_string());
        }
        if !self.api.records_path.starts_with('/') {
            return Err("API records_path must start with '/'".to_string());
        }
        if self.api.request_timeout_ms == 0 {
            return Err("API request_timeout_ms must be greater than 0".to_string());
        }
        if self.storage.max_connections == 0 {
            return Err("Storage max_connections must be greater than 0".to_string());
        }
        if self.cache.version.trim().is_empty() {
            return Err("Cache version cannot be empty".to_string());
        }
        if self.sync.auto_sync && self.sync.interval_secs == 0 {
            return Err(
                "Sync interval_secs must be greater than 0 when auto_sync is on".to_string(),
            );
        }
        if self.sync.stuck_after_attempts == 0 {
            return Err("Sync stuck_after_attempts must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|dir| dir.join("field-sync"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite://{}?mode=rwc", dir.join("offline.db").display())
}

pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(
            cfg.api.records_url(),
            "http://localhost/field-maintenance/php/records"
        );
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(join_url("http://a/b/", "/c"), "http://a/b/c");
        assert_eq!(join_url("http://a", "c"), "http://a/c");
        assert_eq!(join_url("http://a", "https://cdn/x.js"), "https://cdn/x.js");
    }

    #[test]
    fn validate_rejects_zero_attempt_threshold() {
        let mut cfg = AppConfig::default();
        cfg.sync.stuck_after_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_helpers() {
        assert!(parse_bool("YES", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
        assert_eq!(parse_list(" /a, ,/b "), vec!["/a".to_string(), "/b".to_string()]);
    }
}
