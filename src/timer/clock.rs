//! 时钟
//!
//! 同一端点的计时器与传输共享的时间源。

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// 单调时间源，`sleep` 是协议唯一的阻塞点
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

/// 单线程共享的时钟句柄
pub type ClockHandle = Rc<dyn Clock>;

/// 基于 [`Instant::now`] 与 [`std::thread::sleep`] 的真实时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn handle() -> ClockHandle {
        Rc::new(SystemClock)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

/// 只在显式推进时走动的时钟，`sleep` 会立即推进
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Cell<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn advance(&self, d: Duration) {
        self.offset.set(self.offset.get().saturating_add(d));
    }

    pub fn advance_millis(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// 自创建以来经过的时间
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
