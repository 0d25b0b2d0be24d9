//! REST API 客户端 - 业务能力层
//!
//! 封装登录、练习元数据，以及 `/me/exercises/{exercise_uuid}` 的读取和保存

use futures::future::BoxFuture;
use reqwest::header::COOKIE;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::infrastructure::AUTH_COOKIE_NAME;
use crate::models::{Exercise, LoginRequest, SaveSubmissionRequest, UserExercise};
use crate::services::autosave::SubmissionStore;

/// 后端的错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// REST API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::with_base_url(
            config.api_base_url()?,
            config.auth_token.clone(),
        ))
    }

    pub fn with_base_url(base_url: Url, auth_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            auth_token,
        }
    }

    /// 用邮箱和密码登录，成功后后续请求都携带新令牌
    ///
    /// # 参数
    /// - `email`: 登录邮箱
    /// - `password`: 密码
    ///
    /// # 返回
    /// 返回后端通过 `auth_token` Cookie 下发的令牌
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        debug!("登录: {}", url);

        let request = self.http.post(url.clone()).json(&LoginRequest { email, password });
        let response = self.send(request, &url).await?;

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == AUTH_COOKIE_NAME && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ApiError::MissingAuthCookie {
                endpoint: url.to_string(),
            })?;

        info!("✓ 已登录: {}", email);
        self.auth_token = Some(token.clone());
        Ok(token)
    }

    /// 当前使用的认证令牌
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// 获取练习元数据（类型、初始代码、标题）
    ///
    /// # 参数
    /// - `exercise_uuid`: 练习 ID
    pub async fn get_exercise(&self, exercise_uuid: &str) -> Result<Exercise, ApiError> {
        let url = self.endpoint(&["exercises", exercise_uuid])?;
        debug!("获取练习: {}", url);

        let response = self.send(self.http.get(url.clone()), &url).await?;
        Self::parse_json(response, &url).await
    }

    /// 获取用户在某个练习上的进度
    ///
    /// # 参数
    /// - `exercise_uuid`: 练习 ID
    ///
    /// # 返回
    /// 返回进度记录，其中包含上次保存的提交
    pub async fn get_user_exercise(&self, exercise_uuid: &str) -> Result<UserExercise, ApiError> {
        let url = self.exercise_endpoint(exercise_uuid)?;
        debug!("获取练习进度: {}", url);

        let response = self.send(self.http.get(url.clone()), &url).await?;
        Self::parse_json(response, &url).await
    }

    /// 保存草稿
    ///
    /// # 参数
    /// - `exercise_uuid`: 练习 ID
    /// - `request`: 提交类型和内容
    pub async fn save_submission(
        &self,
        exercise_uuid: &str,
        request: &SaveSubmissionRequest,
    ) -> Result<(), ApiError> {
        let url = self.exercise_endpoint(exercise_uuid)?;
        debug!("保存草稿: {}", url);

        self.send(self.http.put(url.clone()).json(request), &url)
            .await?;
        Ok(())
    }

    fn exercise_endpoint(&self, exercise_uuid: &str) -> Result<Url, ApiError> {
        self.endpoint(&["me", "exercises", exercise_uuid])
    }

    /// 在基础地址后追加路径段，每一段都会被转义
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 附加认证 Cookie 并发送，非 2xx 响应转换为 `BadResponse`
    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        let request = match &self.auth_token {
            Some(token) => request.header(COOKIE, format!("{}={}", AUTH_COOKIE_NAME, token)),
            None => request,
        };

        let response = request.send().await.map_err(|source| ApiError::RequestFailed {
            endpoint: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (parsed.error, parsed.code),
            Err(_) if body.trim().is_empty() => (
                status.canonical_reason().unwrap_or("unknown").to_string(),
                None,
            ),
            Err(_) => (body, None),
        };

        Err(ApiError::BadResponse {
            endpoint: url.to_string(),
            status: status.as_u16(),
            message,
            code,
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::JsonParseFailed {
                endpoint: url.to_string(),
                source,
            })
    }
}

impl SubmissionStore for ApiClient {
    fn save<'a>(
        &'a self,
        exercise_uuid: &'a str,
        request: &'a SaveSubmissionRequest,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(self.save_submission(exercise_uuid, request))
    }
}
