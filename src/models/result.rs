use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 单个检查器的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerResult {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl CheckerResult {
    pub fn checker_type(&self) -> CheckerType {
        CheckerType::from(self.kind.as_str())
    }
}

/// 检查器类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckerType {
    Io,
    Code,
    Quiz,
    Other(String),
}

impl From<&str> for CheckerType {
    fn from(kind: &str) -> Self {
        match kind {
            "io" => CheckerType::Io,
            "code" => CheckerType::Code,
            "quiz" => CheckerType::Quiz,
            other => CheckerType::Other(other.to_string()),
        }
    }
}

/// 执行结果信封
///
/// 只有 `job_id` 是必需的，其余字段缺失或为 null 时取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    /// 后端可能发字符串也可能发数字，统一存成字符串
    #[serde(deserialize_with = "string_or_number")]
    pub job_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stdout: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stderr: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub exit_code: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub time: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub memory: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cpu: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub checker_results: Vec<CheckerResult>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_lesson_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_exercise_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,
}

impl ExecuteResult {
    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    pub fn failed_checkers(&self) -> impl Iterator<Item = &CheckerResult> {
        self.checker_results.iter().filter(|c| !c.success)
    }

    /// 下一课 / 下一题（用于自动前进）
    pub fn next_unit(&self) -> (Option<&str>, Option<&str>) {
        (
            self.next_lesson_uuid.as_deref(),
            self.next_exercise_uuid.as_deref(),
        )
    }
}

/// 入站文本帧的分类
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// 带 `job_id` 的执行结果
    Result(ExecuteResult),
    /// 合法 JSON，但不是执行结果
    Ignored,
    /// 无法解析
    Malformed(String),
}

impl InboundFrame {
    pub fn classify(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return InboundFrame::Malformed(e.to_string()),
        };

        let has_job_id = match value.get("job_id") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(id)) => !id.is_empty(),
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(_) => true,
        };
        if !has_job_id {
            return InboundFrame::Ignored;
        }

        match serde_json::from_value::<ExecuteResult>(value) {
            Ok(result) => InboundFrame::Result(result),
            Err(e) => InboundFrame::Malformed(e.to_string()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "job_id 应为字符串或数字，实际为 {}",
            other
        ))),
    }
}

// Go 后端会把空切片编码成 null
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
