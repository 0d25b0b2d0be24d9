//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **初始化**：打印启动信息、按需登录、拉取练习元数据和已保存的进度、打开提交通道并等待连接
//! 2. **运行**：读取源文件，提交运行并输出结果
//! 3. **清理**：保存草稿、关闭通道
//!
//! 不处理任何线上格式，具体流程委托给 `workflow::ExerciseSession`

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::ExerciseType;
use crate::services::{ApiClient, SubmissionChannel};
use crate::utils::logging::{log_result, log_startup, log_verdict};
use crate::workflow::{ExerciseSession, Verdict};

/// 应用主结构
pub struct App {
    config: Config,
    session: ExerciseSession,
}

impl App {
    /// 初始化应用
    ///
    /// # 参数
    /// - `config`: 配置
    /// - `exercise_uuid`: 练习 ID
    ///
    /// # 返回
    /// 登录失败时返回 `Api` 错误，通道在 `connect_timeout` 内未连上时返回 `ConnectTimeout`
    pub async fn initialize(mut config: Config, exercise_uuid: &str) -> AppResult<Self> {
        log_startup(&config, exercise_uuid);

        let mut api = ApiClient::new(&config)?;
        let token = match config.login_credentials() {
            Some((email, password)) => Some(api.login(email, password).await?),
            None => None,
        };
        if token.is_some() {
            // 提交通道握手也要带上新令牌
            config.auth_token = token;
        }
        let api = Arc::new(api);

        let saved = match api.get_user_exercise(exercise_uuid).await {
            Ok(progress) => {
                info!(
                    "✓ 已加载练习进度: 尝试 {} 次{}",
                    progress.attempts,
                    if progress.is_completed() { "，已完成" } else { "" }
                );
                progress.saved_submission()
            }
            Err(e) if e.status() == Some(404) => {
                info!("还没有保存过进度，从空白草稿开始");
                None
            }
            Err(e) => {
                warn!("获取练习进度失败，将从空白草稿开始: {}", e);
                None
            }
        };

        let exercise_type = match api.get_exercise(exercise_uuid).await {
            Ok(exercise) => {
                info!(
                    "📚 练习: {} ({:?})",
                    exercise.title(),
                    exercise.exercise_type
                );
                exercise.exercise_type
            }
            Err(e) => {
                let fallback = saved
                    .as_ref()
                    .map_or(ExerciseType::Code, |s| s.exercise_type());
                warn!("获取练习信息失败，按 {:?} 处理: {}", fallback, e);
                fallback
            }
        };

        let channel = SubmissionChannel::open(&config)?;
        if !channel.wait_until_connected(config.connect_timeout()).await {
            let url = channel.url().to_string();
            channel.close().await;
            return Err(AppError::ConnectTimeout {
                url,
                timeout_secs: config.connect_timeout_secs,
            });
        }

        let session =
            ExerciseSession::new(channel, api, &config, exercise_uuid, exercise_type, saved);

        Ok(Self { config, session })
    }

    /// 练习类型，来自练习元数据
    pub fn exercise_type(&self) -> ExerciseType {
        self.session.exercise_type()
    }

    /// 运行源文件
    ///
    /// # 参数
    /// - `source`: 源文件路径
    ///
    /// # 返回
    /// 返回本次运行的判定
    pub async fn run(&self, source: &Path) -> AppResult<Verdict> {
        let code = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| AppError::file_read_failed(source.display().to_string(), e))?;

        info!(
            "📄 运行 {} ({} 字节, 语言: {})",
            source.display(),
            code.len(),
            self.config.language
        );
        self.session.edit_code(&code);

        let outcome = self.session.run_code(&code).await?;
        log_result(&outcome.result);
        log_verdict(&outcome.verdict);

        Ok(outcome.verdict)
    }

    /// 保存草稿并关闭连接
    pub async fn shutdown(self) {
        self.session.finish().await;
    }
}
