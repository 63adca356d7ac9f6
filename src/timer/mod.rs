//! 计时器模块
//!
//! 单调时钟，以及协议中所有超时（广播、握手过期、存活检测、重发抑制）
//! 所用的可重启单次倒计时器。

mod clock;
mod countdown;

pub use clock::{Clock, ClockHandle, ManualClock, SystemClock};
pub use countdown::CountdownTimer;
