//! 倒计时器
//!
//! [`CountdownTimer::just_expired`] 为边沿触发：每次到期只报告一次，
//! 直到下一次 [`CountdownTimer::reset`]。

use std::time::{Duration, Instant};

use super::clock::ClockHandle;

pub struct CountdownTimer {
    clock: ClockHandle,
    duration: Duration,
    deadline: Option<Instant>,
    // 已报告到期或已停止时置位
    expired: bool,
}

impl CountdownTimer {
    /// 在最近一次 reset 之后 `duration` 到期；以停止状态创建的计时器在 reset 前不会到期
    pub fn new(duration: Duration, started: bool, clock: ClockHandle) -> Self {
        let mut timer = Self {
            clock,
            duration,
            deadline: None,
            expired: true,
        };
        if started {
            timer.reset();
        }
        timer
    }

    pub fn from_millis(ms: u64, started: bool, clock: ClockHandle) -> Self {
        Self::new(Duration::from_millis(ms), started, clock)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 设定到期时间为 `now + duration`
    pub fn reset(&mut self) -> &mut Self {
        self.deadline = Some(self.clock.now() + self.duration);
        self.expired = false;
        self
    }

    /// 取消尚未到期的计时
    pub fn stop(&mut self) {
        self.expired = true;
    }

    /// 计时器已启动且尚未报告到期
    pub fn is_running(&self) -> bool {
        !self.expired
    }

    /// 每次 reset 后只返回一次 true：到期时刻或之后的第一次调用
    pub fn just_expired(&mut self) -> bool {
        if self.expired {
            return false;
        }
        let Some(deadline) = self.deadline else {
            return false;
        };
        self.expired = self.clock.now() >= deadline;
        self.expired
    }

    /// 距到期的剩余时间，未运行时为 `None`
    pub fn remaining(&self) -> Option<Duration> {
        if self.expired {
            return None;
        }
        let deadline = self.deadline?;
        Some(deadline.saturating_duration_since(self.clock.now()))
    }

    /// 在时钟上阻塞到到期时刻，不消耗到期事件
    pub fn sleep_until_expired(&self) {
        if let Some(left) = self.remaining() {
            self.clock.sleep(left);
        }
    }
}

impl std::fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("duration", &self.duration)
            .field("deadline", &self.deadline)
            .field("expired", &self.expired)
            .finish()
    }
}
