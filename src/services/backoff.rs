//! 重连退避策略
//!
//! 第 `attempts` 次失败后的等待时间为 `min(base * 2^attempts, max)`，
//! 次数本身不设上限，只有间隔封顶

use std::time::Duration;

/// 指数退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub const DEFAULT_BASE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MAX: Duration = Duration::from_millis(30_000);

    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// 计算已经连续失败 `attempts` 次之后的重连间隔
    pub fn delay(&self, attempts: u32) -> Duration {
        1u32.checked_shl(attempts)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_MAX)
    }
}
