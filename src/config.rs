// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use serde::{Deserialize, Serialize};

/// 外部配置文件中的引擎相关字段，全部可选
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub ytdlp_path: Option<String>,
    pub cookies_browser: Option<String>,
    pub geo_bypass_country: Option<String>,
    pub user_agent: Option<String>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            engine: EngineConfig::default(),
        }
    }
}

/// 运行时配置，由 CLI 参数与外部配置文件合并而来，构造后不再变化
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ytdlp_path: Option<String>,
    pub cookies_browser: String,
    pub geo_bypass_country: String,
    pub user_agent: String,
    pub max_attempts: u32,
    pub backoff_step_secs: u64,
}

impl AppConfig {
    pub fn new(_args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        let engine = external_config.engine;

        Ok(Self {
            ytdlp_path: engine.ytdlp_path,
            cookies_browser: engine
                .cookies_browser
                .unwrap_or_else(|| constants::DEFAULT_COOKIES_BROWSER.to_string()),
            geo_bypass_country: engine
                .geo_bypass_country
                .unwrap_or_else(|| constants::DEFAULT_GEO_BYPASS_COUNTRY.to_string()),
            user_agent: engine
                .user_agent
                .unwrap_or_else(|| constants::USER_AGENT.to_string()),
            max_attempts: engine.max_attempts.unwrap_or(constants::MAX_ATTEMPTS),
            backoff_step_secs: constants::BACKOFF_STEP_SECS,
        })
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            cookies_browser: constants::DEFAULT_COOKIES_BROWSER.to_string(),
            geo_bypass_country: constants::DEFAULT_GEO_BYPASS_COUNTRY.to_string(),
            user_agent: "test-agent/1.0".to_string(),
            max_attempts: constants::MAX_ATTEMPTS,
            backoff_step_secs: constants::BACKOFF_STEP_SECS,
        }
    }
}
