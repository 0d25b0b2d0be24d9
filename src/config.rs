use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::{ConfigError, FileError};
use crate::services::backoff::Backoff;

const MIN_BACKOFF_BASE: Duration = Duration::from_millis(1);

/// 程序配置文件
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 前端所在的源地址，WebSocket 与 REST 都挂在同一源下
    pub server_origin: String,
    /// WebSocket 路径
    pub ws_path: String,
    /// REST API 前缀
    pub api_base_path: String,
    /// 认证令牌，以 `auth_token` Cookie 形式携带
    pub auth_token: Option<String>,
    /// 登录邮箱，与 `password` 同时设置且没有 `auth_token` 时启动前先登录
    pub email: Option<String>,
    pub password: Option<String>,
    /// 重连退避的基础间隔（毫秒）
    pub backoff_base_ms: u64,
    /// 重连退避的上限（毫秒）
    pub backoff_max_ms: u64,
    /// 自动保存检查间隔（秒）
    pub autosave_interval_secs: u64,
    /// 等待执行结果的超时（秒）
    pub result_timeout_secs: u64,
    /// 等待通道首次连上的超时（秒）
    pub connect_timeout_secs: u64,
    /// 代码语言，决定入口文件扩展名
    pub language: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_origin: "http://localhost:8080".to_string(),
            ws_path: "/ws".to_string(),
            api_base_path: "/api/v1".to_string(),
            auth_token: None,
            email: None,
            password: None,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            autosave_interval_secs: 5,
            result_timeout_secs: 60,
            connect_timeout_secs: 10,
            language: "python".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// 从 TOML 文件加载，文件中缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;

        Ok(config)
    }

    /// 先读配置文件（如果有），再叠加环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// 用 `lookup` 提供的值覆盖对应字段
    ///
    /// 数值或布尔值无法解析时保留原值并打印警告
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str, current: u64| -> u64 {
            match lookup(key) {
                Some(value) => value.parse().unwrap_or_else(|_| {
                    warn!("环境变量 {} 的值 '{}' 无法解析为整数，使用 {}", key, value, current);
                    current
                }),
                None => current,
            }
        };

        Self {
            server_origin: lookup("CODIM_SERVER_ORIGIN").unwrap_or(self.server_origin),
            ws_path: lookup("CODIM_WS_PATH").unwrap_or(self.ws_path),
            api_base_path: lookup("CODIM_API_BASE_PATH").unwrap_or(self.api_base_path),
            auth_token: lookup("CODIM_AUTH_TOKEN").or(self.auth_token),
            email: lookup("CODIM_EMAIL").or(self.email),
            password: lookup("CODIM_PASSWORD").or(self.password),
            backoff_base_ms: parsed("CODIM_BACKOFF_BASE_MS", self.backoff_base_ms),
            backoff_max_ms: parsed("CODIM_BACKOFF_MAX_MS", self.backoff_max_ms),
            autosave_interval_secs: parsed(
                "CODIM_AUTOSAVE_INTERVAL_SECS",
                self.autosave_interval_secs,
            ),
            result_timeout_secs: parsed("CODIM_RESULT_TIMEOUT_SECS", self.result_timeout_secs),
            connect_timeout_secs: parsed("CODIM_CONNECT_TIMEOUT_SECS", self.connect_timeout_secs),
            language: lookup("CODIM_LANGUAGE").unwrap_or(self.language),
            verbose_logging: lookup("CODIM_VERBOSE_LOGGING")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
        }
    }

    /// WebSocket 地址：协议跟随源地址（https → wss，http → ws）
    pub fn ws_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.origin()?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })?;
        url.set_path(&self.ws_path);
        Ok(url)
    }

    /// REST API 基础地址
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.origin()?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        }
        url.set_path(&self.api_base_path);
        Ok(url)
    }

    /// 重连退避策略，基础间隔至少 1 毫秒，上限不小于基础间隔
    pub fn backoff(&self) -> Backoff {
        let base = Duration::from_millis(self.backoff_base_ms).max(MIN_BACKOFF_BASE);
        let max = Duration::from_millis(self.backoff_max_ms).max(base);
        Backoff::new(base, max)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 需要登录时返回邮箱和密码；已有令牌或凭据不全时返回 None
    pub fn login_credentials(&self) -> Option<(&str, &str)> {
        if self.auth_token.is_some() {
            return None;
        }
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }

    fn origin(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.server_origin).map_err(|source| ConfigError::InvalidUrl {
            url: self.server_origin.clone(),
            source,
        })?;
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}
