//! 练习会话 - 流程层
//!
//! 定义"做一道练习"的完整流程：
//! 编辑（自动保存草稿）→ 运行（提交并等待结果）→ 结束（保存并断开）

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ExecuteResult, ExerciseType, FileEntry, QuizAnswers, Submission};
use crate::services::{Autosaver, SubmissionChannel, SubmissionStore};
use crate::workflow::verdict::Verdict;

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub result: Arc<ExecuteResult>,
}

/// 练习会话
///
/// 持有提交通道和自动保存器，结束时请调用 `finish()`
pub struct ExerciseSession {
    channel: SubmissionChannel,
    autosaver: Autosaver,
    exercise_uuid: String,
    exercise_type: ExerciseType,
    language: String,
    result_timeout: Duration,
}

impl ExerciseSession {
    /// 创建会话
    ///
    /// # 参数
    /// - `channel`: 提交通道
    /// - `store`: 草稿保存目标
    /// - `config`: 配置（语言、自动保存间隔、结果超时）
    /// - `exercise_uuid`: 练习 ID
    /// - `exercise_type`: 练习类型
    /// - `saved`: 服务端已保存的提交
    pub fn new<S: SubmissionStore>(
        channel: SubmissionChannel,
        store: Arc<S>,
        config: &Config,
        exercise_uuid: impl Into<String>,
        exercise_type: ExerciseType,
        saved: Option<Submission>,
    ) -> Self {
        let exercise_uuid = exercise_uuid.into();
        let autosaver = Autosaver::spawn(
            store,
            exercise_uuid.clone(),
            config.autosave_interval(),
            saved,
        );

        Self {
            channel,
            autosaver,
            exercise_uuid,
            exercise_type,
            language: config.language.clone(),
            result_timeout: config.result_timeout(),
        }
    }

    pub fn exercise_uuid(&self) -> &str {
        &self.exercise_uuid
    }

    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }

    pub fn channel(&self) -> &SubmissionChannel {
        &self.channel
    }

    /// 当前草稿（可能来自服务端保存的进度）
    pub fn draft(&self) -> Option<Submission> {
        self.autosaver.draft()
    }

    /// 编辑代码，草稿交给自动保存
    pub fn edit_code(&self, code: &str) {
        self.autosaver.update(FileEntry::source(code, &self.language));
    }

    pub fn edit_quiz(&self, answers: QuizAnswers) {
        self.autosaver.update(answers);
    }

    /// 运行代码
    ///
    /// # 参数
    /// - `code`: 编辑器中的源码，会被包装成 `main.<ext>`
    ///
    /// # 返回
    /// 返回判定和完整执行结果
    pub async fn run_code(&self, code: &str) -> AppResult<RunOutcome> {
        let entry = FileEntry::source(code, &self.language);
        self.autosaver.update(entry.clone());
        self.run(Submission::Code(entry)).await
    }

    /// 提交测验答案
    pub async fn run_quiz(&self, answers: QuizAnswers) -> AppResult<RunOutcome> {
        self.autosaver.update(answers.clone());
        self.run(Submission::Quiz(answers)).await
    }

    /// 保存草稿并关闭通道
    pub async fn finish(self) {
        self.autosaver.stop().await;
        self.channel.close().await;
        info!("✓ 练习会话已结束: {}", self.exercise_uuid);
    }

    async fn run(&self, submission: Submission) -> AppResult<RunOutcome> {
        if submission.exercise_type() != self.exercise_type {
            warn!(
                "提交类型 {:?} 与练习类型 {:?} 不一致",
                submission.exercise_type(),
                self.exercise_type
            );
        }

        // 先订阅再提交，订阅之前的结果视为已读
        let mut results = self.channel.subscribe_results();
        self.channel.submit(&self.exercise_uuid, &submission)?;
        info!("🚀 已提交练习: {}", self.exercise_uuid);

        match tokio::time::timeout(self.result_timeout, results.changed()).await {
            Err(_) => Err(AppError::ResultTimeout {
                exercise_uuid: self.exercise_uuid.clone(),
                timeout_secs: self.result_timeout.as_secs(),
            }),
            Ok(Err(_)) => Err(AppError::ChannelClosed),
            Ok(Ok(())) => {
                let result = results
                    .borrow_and_update()
                    .clone()
                    .ok_or(AppError::ChannelClosed)?;
                Ok(RunOutcome {
                    verdict: Verdict::from(result.as_ref()),
                    result,
                })
            }
        }
    }
}
