use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::language;

/// 代码提交：单个文件或一棵目录树
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileEntry>,
}

impl FileEntry {
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
            children: Vec::new(),
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<FileEntry>) -> Self {
        Self {
            name: name.into(),
            content: None,
            children,
        }
    }

    /// 把编辑器里的代码包装成 `main.<ext>` 入口文件
    pub fn source(code: &str, language: &str) -> Self {
        Self::file(language::entry_file_name(language), code)
    }

    /// 没有子节点，且内容为空或只有空白
    pub fn is_blank(&self) -> bool {
        self.children.is_empty()
            && self
                .content
                .as_deref()
                .map_or(true, |content| content.trim().is_empty())
    }
}

/// 测验提交
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizAnswers {
    /// 题目 ID → 选项 ID
    pub answers: BTreeMap<String, String>,

    /// 题目 ID → 是否答对（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<String, bool>>,
}

impl QuizAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, question_id: impl Into<String>, answer_id: impl Into<String>) -> Self {
        self.answers.insert(question_id.into(), answer_id.into());
        self
    }
}

/// 提交内容
///
/// 线上格式不带类型标签，后端根据练习的元数据区分代码和测验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    Quiz(QuizAnswers),
    Code(FileEntry),
}

impl Submission {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            Submission::Quiz(_) => ExerciseType::Quiz,
            Submission::Code(_) => ExerciseType::Code,
        }
    }

    /// 空白代码或没有作答的测验不值得保存
    pub fn is_blank(&self) -> bool {
        match self {
            Submission::Quiz(quiz) => quiz.answers.is_empty(),
            Submission::Code(entry) => entry.is_blank(),
        }
    }
}

impl From<FileEntry> for Submission {
    fn from(entry: FileEntry) -> Self {
        Submission::Code(entry)
    }
}

impl From<QuizAnswers> for Submission {
    fn from(quiz: QuizAnswers) -> Self {
        Submission::Quiz(quiz)
    }
}

/// 通过 WebSocket 发出的提交信封
#[derive(Debug, Serialize)]
pub struct SubmissionEnvelope<'a, S: ?Sized> {
    pub exercise_uuid: &'a str,
    pub submission: &'a S,
}

impl<'a, S: Serialize + ?Sized> SubmissionEnvelope<'a, S> {
    pub fn new(exercise_uuid: &'a str, submission: &'a S) -> Self {
        Self {
            exercise_uuid,
            submission,
        }
    }
}

/// 练习类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Code,
    Quiz,
}

/// `PUT /me/exercises/{exercise_uuid}` 的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSubmissionRequest {
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub submission: Submission,
}

/// 用户在某个练习上的进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserExercise {
    pub uuid: String,
    pub exercise_uuid: String,

    #[serde(default)]
    pub submission: serde_json::Value,

    #[serde(default)]
    pub attempts: i32,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserExercise {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// 取出之前保存过的提交
    ///
    /// 代码提交必须同时有文件名和内容才算数
    pub fn saved_submission(&self) -> Option<Submission> {
        if self.submission.is_null() {
            return None;
        }

        match serde_json::from_value::<Submission>(self.submission.clone()).ok()? {
            Submission::Code(entry) if entry.name.is_empty() || entry.is_blank() => None,
            submission => Some(submission),
        }
    }
}
