use serde::{Deserialize, Serialize};

use crate::models::submission::{ExerciseType, FileEntry};

/// 练习元数据（`GET /exercises/{uuid}`）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Exercise {
    pub uuid: String,

    #[serde(default)]
    pub lesson_uuid: String,

    #[serde(default)]
    pub order_index: i16,

    #[serde(default)]
    pub reward: i16,

    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,

    /// 代码练习的初始文件
    #[serde(default)]
    pub code_data: Option<FileEntry>,

    #[serde(default)]
    pub quiz_data: Option<serde_json::Value>,

    #[serde(default)]
    pub translation: Option<ExerciseTranslation>,
}

impl Exercise {
    /// 练习标题，没有翻译时退回 uuid
    pub fn title(&self) -> &str {
        self.translation
            .as_ref()
            .map_or(self.uuid.as_str(), |t| t.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExerciseTranslation {
    #[serde(default)]
    pub language: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `POST /auth/login` 的请求体
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
