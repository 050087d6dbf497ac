use std::{env, fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_TMDB_LANGUAGE: &str = "en-US";
pub const DEFAULT_DATA_DIR: &str = ".reeltalk";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub tmdb_api_key: Option<String>,
    pub tmdb_language: String,
    pub request_timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_URL.to_string(),
            tmdb_api_key: None,
            tmdb_language: DEFAULT_TMDB_LANGUAGE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(alias = "base_url")]
    backend_base_url: Option<String>,
    #[serde(alias = "api_key")]
    tmdb_api_key: Option<String>,
    tmdb_language: Option<String>,
    request_timeout_secs: Option<u64>,
    data_dir: Option<String>,
}

pub fn load_config() -> AppConfig {
    let cfg_path = PathBuf::from(CONFIG_FILE);

    let raw = match fs::read_to_string(&cfg_path) {
        Ok(txt) => match parse_config(&txt) {
            Ok(parsed) => {
                info!("Loaded config from {}", cfg_path.display());
                parsed
            }
            Err(err) => {
                warn!("Failed to parse {} ({}). Using defaults.", cfg_path.display(), err);
                RawConfig::default()
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
            RawConfig::default()
        }
    };

    let mut cfg = merge(AppConfig::default(), raw);
    apply_env_overrides(&mut cfg);
    cfg
}

fn parse_config(txt: &str) -> serde_json::Result<RawConfig> {
    serde_json::from_str::<RawConfig>(txt)
}

fn merge(mut cfg: AppConfig, raw: RawConfig) -> AppConfig {
    if let Some(url) = raw.backend_base_url.filter(|s| !s.trim().is_empty()) {
        cfg.backend_base_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(key) = raw.tmdb_api_key.filter(|s| !s.trim().is_empty()) {
        cfg.tmdb_api_key = Some(key.trim().to_string());
    }
    if let Some(lang) = raw.tmdb_language.filter(|s| !s.trim().is_empty()) {
        cfg.tmdb_language = lang;
    }
    if let Some(secs) = raw.request_timeout_secs {
        if secs == 0 {
            warn!("request_timeout_secs must be positive; keeping {}", cfg.request_timeout_secs);
        } else {
            cfg.request_timeout_secs = secs;
        }
    }
    if let Some(dir) = raw.data_dir.filter(|s| !s.trim().is_empty()) {
        cfg.data_dir = PathBuf::from(dir);
    }
    cfg
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(url) = env::var("REELTALK_BACKEND_URL") {
        if !url.trim().is_empty() {
            cfg.backend_base_url = url.trim().trim_end_matches('/').to_string();
        }
    }
    if let Ok(key) = env::var("REELTALK_TMDB_API_KEY") {
        if !key.trim().is_empty() {
            cfg.tmdb_api_key = Some(key.trim().to_string());
        }
    }
}
