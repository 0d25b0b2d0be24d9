use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 提交错误
    #[error("提交错误: {0}")]
    Submit(#[from] SubmitError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 执行后端迟迟未连接
    #[error("连接执行后端超时 ({url}, {timeout_secs}秒)")]
    ConnectTimeout { url: String, timeout_secs: u64 },
    /// 已提交但没有等到结果
    #[error("等待执行结果超时 (练习: {exercise_uuid}, {timeout_secs}秒)")]
    ResultTimeout {
        exercise_uuid: String,
        timeout_secs: u64,
    },
    /// 提交通道在等待结果时被关闭
    #[error("提交通道已关闭")]
    ChannelClosed,
}

/// 传输层错误
///
/// 只在基础设施层和提交通道内部流转，不会抛给通道的使用者
#[derive(Debug, Error)]
pub enum TransportError {
    /// 建立连接失败（拒绝、超时、握手失败）
    #[error("连接失败 ({url}): {message}")]
    Connect { url: String, message: String },
    /// 发送帧失败
    #[error("发送失败: {0}")]
    Send(String),
    /// 接收帧失败
    #[error("接收失败: {0}")]
    Receive(String),
}

/// 提交错误
///
/// 本地同步信号：提交不会被排队，也不会被重试
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 通道当前不处于 Open 状态
    #[error("通道未连接，提交已丢弃 (练习: {exercise_uuid})")]
    NotConnected { exercise_uuid: String },
    /// 提交内容无法序列化
    #[error("序列化提交失败: {0}")]
    Encode(#[from] serde_json::Error),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
        code: Option<String>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 无法拼接接口地址
    #[error("无效的接口地址: {0}")]
    InvalidEndpoint(String),
    /// 登录成功但响应里没有认证 Cookie
    #[error("登录响应缺少认证 Cookie ({endpoint})")]
    MissingAuthCookie { endpoint: String },
}

impl ApiError {
    /// 后端返回的 HTTP 状态码（仅 BadResponse 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 服务地址无法解析
    #[error("无效的服务地址 '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// 服务地址协议不受支持
    #[error("不支持的协议: {scheme}")]
    UnsupportedScheme { scheme: String },
    /// 配置文件读取或解析失败
    #[error("配置文件错误: {0}")]
    File(#[from] FileError),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
