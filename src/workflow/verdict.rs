use crate::models::ExecuteResult;

/// 一次运行的判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 通过，后端可能给出下一课 / 下一题
    Passed {
        next_lesson_uuid: Option<String>,
        next_exercise_uuid: Option<String>,
    },
    /// 未通过
    Failed {
        /// 未通过的检查器提示
        failed_checkers: Vec<String>,
        has_stderr: bool,
    },
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed { .. })
    }
}

impl From<&ExecuteResult> for Verdict {
    fn from(result: &ExecuteResult) -> Self {
        if result.passed {
            return Verdict::Passed {
                next_lesson_uuid: result.next_lesson_uuid.clone(),
                next_exercise_uuid: result.next_exercise_uuid.clone(),
            };
        }

        Verdict::Failed {
            failed_checkers: result
                .failed_checkers()
                .map(|c| {
                    if c.message.is_empty() {
                        c.kind.clone()
                    } else {
                        c.message.clone()
                    }
                })
                .collect(),
            has_stderr: result.has_stderr(),
        }
    }
}
