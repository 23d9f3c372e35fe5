use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::ConfigError;

/// 默认后端地址
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// 默认数据目录名 (位于系统数据目录下)
pub const APP_DIR_NAME: &str = "interview-coach";

/// 构建环境
///
/// 生产环境才会发起单条远程提交;开发环境的回退界面才会显示原始错误与堆栈。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProfile {
    Development,
    Production,
}

impl BuildProfile {
    pub fn is_production(self) -> bool {
        self == BuildProfile::Production
    }

    pub fn is_development(self) -> bool {
        self == BuildProfile::Development
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildProfile::Development),
            "production" | "prod" => Ok(BuildProfile::Production),
            other => Err(format!("未知的环境: {}", other)),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 后端地址
    pub api_base_url: String,
    pub profile: BuildProfile,
    /// 本地存储与日志所在目录
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    /// 健康探测间隔 (仅 watch 命令使用)
    pub health_interval: Duration,
}

impl AppConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// 配置服务
///
/// 加载顺序: `.env` 文件 (存在时) → 进程环境变量。
/// 格式错误的值直接报错,不会静默回退到默认值。
pub struct ConfigService;

impl ConfigService {
    /// 从 `.env` 与环境变量加载配置
    pub fn load() -> Result<AppConfig, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "已加载 .env 文件"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, ".env 文件解析失败,忽略"),
        }

        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("COACH_"))
            .collect();

        Self::from_vars(&vars, dirs::data_dir())
    }

    /// 从变量表构造配置
    ///
    /// - COACH_API_URL: 后端地址 (默认: http://localhost:5000)
    /// - COACH_ENV: development | production (默认: development)
    /// - COACH_DATA_DIR: 数据目录 (默认: 系统数据目录/interview-coach)
    /// - COACH_REQUEST_TIMEOUT_SECS: 请求超时秒数 (默认: 10)
    /// - COACH_HEALTH_INTERVAL_SECS: 健康探测间隔秒数 (默认: 15)
    pub fn from_vars(
        vars: &HashMap<String, String>,
        system_data_dir: Option<PathBuf>,
    ) -> Result<AppConfig, ConfigError> {
        let api_base_url = vars
            .get("COACH_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "COACH_API_URL",
                message: format!("必须以 http:// 或 https:// 开头: {}", api_base_url),
            });
        }

        let profile = match vars.get("COACH_ENV") {
            Some(value) => value
                .parse::<BuildProfile>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "COACH_ENV",
                    message,
                })?,
            None => BuildProfile::Development,
        };

        let data_dir = match vars.get("COACH_DATA_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => system_data_dir
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::MissingDataDir)?,
        };

        let request_timeout = Self::parse_secs(vars, "COACH_REQUEST_TIMEOUT_SECS", 10)?;
        let health_interval = Self::parse_secs(vars, "COACH_HEALTH_INTERVAL_SECS", 15)?;

        let config = AppConfig {
            api_base_url,
            profile,
            data_dir,
            request_timeout,
            health_interval,
        };

        tracing::debug!(
            api_base_url = %config.api_base_url,
            profile = ?config.profile,
            data_dir = %config.data_dir.display(),
            "配置已加载"
        );

        Ok(config)
    }

    fn parse_secs(
        vars: &HashMap<String, String>,
        key: &'static str,
        default: u64,
    ) -> Result<Duration, ConfigError> {
        let Some(raw) = vars.get(key) else {
            return Ok(Duration::from_secs(default));
        };

        match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue {
                key,
                message: "必须大于0".to_string(),
            }),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(ConfigError::InvalidValue {
                key,
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config =
            ConfigService::from_vars(&HashMap::new(), Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.profile, BuildProfile::Development);
        assert_eq!(config.data_dir, PathBuf::from("/data/interview-coach"));
        assert_eq!(config.log_dir(), PathBuf::from("/data/interview-coach/logs"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = ConfigService::from_vars(
            &vars(&[
                ("COACH_API_URL", "https://coach.example.com/"),
                ("COACH_ENV", "production"),
                ("COACH_DATA_DIR", "/tmp/coach"),
                ("COACH_REQUEST_TIMEOUT_SECS", "3"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://coach.example.com");
        assert!(config.profile.is_production());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/coach"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_env_is_rejected() {
        let result = ConfigService::from_vars(&vars(&[("COACH_ENV", "staging")]), None);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "COACH_ENV", .. })
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = ConfigService::from_vars(
            &vars(&[("COACH_REQUEST_TIMEOUT_SECS", "0")]),
            Some(PathBuf::from("/data")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_data_dir() {
        let result = ConfigService::from_vars(&HashMap::new(), None);
        assert!(matches!(result, Err(ConfigError::MissingDataDir)));
    }

    #[test]
    fn test_url_scheme_required() {
        let result = ConfigService::from_vars(
            &vars(&[("COACH_API_URL", "localhost:5000")]),
            Some(PathBuf::from("/data")),
        );
        assert!(result.is_err());
    }
}
