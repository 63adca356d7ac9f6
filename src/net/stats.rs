//! 统计信息
//!
//! 每个端点的协议计数器，由可执行程序在退出时打印。

use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub send_failures: u64,
    pub received: u64,
    /// 长度错误的数据报
    pub malformed: u64,
    /// 序列号早于期望远端序列号的带内数据包
    pub duplicates: u64,
    /// 回显不一致后的纠正重发
    pub resends: u64,
    pub resends_suppressed: u64,
    pub handshakes: u64,
    pub disconnects: u64,
}

impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} send_failures={} received={} malformed={} duplicates={} resends={} resends_suppressed={} handshakes={} disconnects={}",
            self.sent,
            self.send_failures,
            self.received,
            self.malformed,
            self.duplicates,
            self.resends,
            self.resends_suppressed,
            self.handshakes,
            self.disconnects
        )
    }
}
