/// 日志工具模块
///
/// 提供启动信息和执行结果的格式化输出
use tracing::{info, warn};

use crate::config::Config;
use crate::models::ExecuteResult;
use crate::workflow::Verdict;

/// 输出内容在日志中最多显示的字符数
const MAX_OUTPUT_CHARS: usize = 2000;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 当前配置
/// - `exercise_uuid`: 要做的练习
pub fn log_startup(config: &Config, exercise_uuid: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 练习提交客户端");
    info!("🌐 服务地址: {}", config.server_origin);
    info!("📝 练习: {}", exercise_uuid);
    info!("🔤 语言: {}", config.language);
    if let Some((email, _)) = config.login_credentials() {
        info!("🔑 将以 {} 登录", email);
    } else if config.auth_token.is_none() {
        warn!("⚠️ 未配置 CODIM_AUTH_TOKEN 或登录凭据，后端可能拒绝连接");
    }
    info!("{}", "=".repeat(60));
}

/// 记录执行结果
///
/// # 参数
/// - `result`: 后端返回的执行结果
pub fn log_result(result: &ExecuteResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📊 job_id={} exit_code={} 用时 {:.3}s 内存 {:.0}KB",
        result.job_id, result.exit_code, result.time, result.memory
    );

    if !result.stdout.is_empty() {
        info!("stdout:\n{}", truncate_text(&result.stdout, MAX_OUTPUT_CHARS));
    }
    if result.has_stderr() {
        warn!("stderr:\n{}", truncate_text(&result.stderr, MAX_OUTPUT_CHARS));
    }

    for checker in &result.checker_results {
        let mark = if checker.success { "✅" } else { "❌" };
        info!("{} [{}] {}", mark, checker.kind, checker.message);
    }
    info!("{}", "─".repeat(60));
}

/// 记录判定
pub fn log_verdict(verdict: &Verdict) {
    match verdict {
        Verdict::Passed {
            next_lesson_uuid,
            next_exercise_uuid,
        } => {
            info!("🎉 通过！");
            if let Some(next) = next_exercise_uuid {
                info!("➡️ 下一题: {}", next);
            }
            if let Some(next) = next_lesson_uuid {
                info!("➡️ 下一课: {}", next);
            }
        }
        Verdict::Failed {
            failed_checkers,
            has_stderr,
        } => {
            warn!("❌ 未通过: {} 个检查未通过", failed_checkers.len());
            if *has_stderr {
                warn!("程序有错误输出，请检查 stderr");
            }
        }
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
