use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::utils::error::{AppError, AppResult};
use crate::utils::rks_utils::{DEFAULT_GOOD_JUDGMENT, DEFAULT_PERFECT_JUDGMENT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 规范化谱面的保存目录
    pub storage_dir: String,
    /// 记录未携带判定区间时使用的默认值（毫秒）
    pub default_perfect_judgment: i32,
    pub default_good_judgment: i32,
    pub leaderboard_page_size: usize,
    pub log_level: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// 从环境变量读取，缺失或无法解析的项使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_dir: env_or("STORAGE_DIR", defaults.storage_dir),
            default_perfect_judgment: env_or("DEFAULT_PERFECT_JUDGMENT", defaults.default_perfect_judgment),
            default_good_judgment: env_or("DEFAULT_GOOD_JUDGMENT", defaults.default_good_judgment),
            leaderboard_page_size: env_or("LEADERBOARD_PAGE_SIZE", defaults.leaderboard_page_size),
            log_level: env_or("RUST_LOG", defaults.log_level),
        }
    }

    /// 设置了 `CONFIG_FILE` 时从该 JSON 文件读取，否则读取环境变量
    pub fn load() -> Self {
        let Ok(path) = env::var("CONFIG_FILE") else {
            return Self::from_env();
        };
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("配置文件 {path} 加载失败，改用环境变量: {e}");
                Self::from_env()
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("已从 {} 加载配置", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.default_perfect_judgment <= 0 || self.default_good_judgment <= 0 {
            return Err(AppError::ConfigError("判定区间必须为正数".to_string()));
        }
        if self.leaderboard_page_size == 0 {
            return Err(AppError::ConfigError("排行榜分页大小不能为 0".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: "charts".to_string(),
            default_perfect_judgment: DEFAULT_PERFECT_JUDGMENT,
            default_good_judgment: DEFAULT_GOOD_JUDGMENT,
            leaderboard_page_size: 20,
            log_level: "info".to_string(),
        }
    }
}

lazy_static! {
    pub static ref CONFIG: Arc<AppConfig> = Arc::new(AppConfig::load());
}
