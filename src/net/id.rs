//! 标识符类型
//!
//! 数据包前两个字段携带的端点 id。

use std::fmt;

use rand::Rng;

/// 随机协商的 32 位端点 id，`0` 保留为 [`PeerId::UNKNOWN`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeerId(pub u32);

impl PeerId {
    /// 无 id：未绑定的对端，或未提出 id 变更
    pub const UNKNOWN: PeerId = PeerId(0);

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// 随机取一个既不是 `UNKNOWN` 也不在 `excluding` 中的 id
    pub fn random_excluding<R: Rng + ?Sized>(rng: &mut R, excluding: &[PeerId]) -> PeerId {
        loop {
            let id = PeerId(rng.r#gen());
            if !id.is_unknown() && !excluding.contains(&id) {
                return id;
            }
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
