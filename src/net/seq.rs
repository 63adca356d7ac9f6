//! 序列号
//!
//! 固定位宽的模计数器，按半环回绕比较大小（与 TCP 序列号空间的比较方式相同）。
//!
//! 位宽是类型的一部分，不同位宽的计数器无法比较，编译期即报错：
//!
//! ```compile_fail
//! use scorelink::net::SequenceNumber;
//!
//! let a = SequenceNumber::<4>::new();
//! let b = SequenceNumber::<8>::new();
//! let _ = a < b;
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// 模 `2^BITS` 的计数器。
///
/// `a < b` 当且仅当 `b` 落在从 `a` 之后开始的前向半环内。
/// 两者恰好相差半环时 `a < b` 与 `b < a` 同时成立（远端边界为闭区间）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceNumber<const BITS: u32> {
    n: u64,
}

/// 线上序列号字段的位宽
pub type WireSeq = SequenceNumber<32>;

impl<const BITS: u32> SequenceNumber<BITS> {
    const VALID_WIDTH: () = assert!(BITS >= 2 && BITS <= 64, "sequence number width must be 2..=64 bits");

    pub const BITS: u32 = BITS;

    const MASK: u64 = if BITS >= 64 { u64::MAX } else { (1u64 << BITS) - 1 };
    const HALF: u64 = 1u64 << (BITS - 1);

    /// 零
    pub fn new() -> Self {
        Self::from_raw(0)
    }

    /// 由任意整数构造，取模 `2^BITS`
    pub fn from_raw(n: u64) -> Self {
        let () = Self::VALID_WIDTH;
        Self { n: n & Self::MASK }
    }

    pub fn as_uint(self) -> u64 {
        self.n
    }

    /// 返回当前值，然后加一
    pub fn post_increment(&mut self) -> Self {
        let prev = *self;
        *self += 1;
        prev
    }

    /// 定宽小端编码，共 `ceil(BITS / 8)` 字节
    pub fn to_bytes(self) -> Vec<u8> {
        let width = BITS.div_ceil(8) as usize;
        self.n.to_le_bytes()[..width].to_vec()
    }

    fn precedes(self, other: Self) -> bool {
        let (a, b) = (self.n, other.n);
        let c = a.wrapping_add(Self::HALF) & Self::MASK;
        if a < c {
            a < b && b <= c
        } else {
            a < b || b <= c
        }
    }
}

impl<const BITS: u32> PartialOrd for SequenceNumber<BITS> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.n == other.n {
            Some(Ordering::Equal)
        } else if self.precedes(*other) {
            Some(Ordering::Less)
        } else {
            Some(Ordering::Greater)
        }
    }

    fn lt(&self, other: &Self) -> bool {
        self.precedes(*other)
    }

    fn le(&self, other: &Self) -> bool {
        self == other || self.precedes(*other)
    }

    fn gt(&self, other: &Self) -> bool {
        !self.le(other)
    }

    fn ge(&self, other: &Self) -> bool {
        !self.lt(other)
    }
}

impl<const BITS: u32> AddAssign<u64> for SequenceNumber<BITS> {
    fn add_assign(&mut self, rhs: u64) {
        self.n = self.n.wrapping_add(rhs) & Self::MASK;
    }
}

impl<const BITS: u32> Add<u64> for SequenceNumber<BITS> {
    type Output = Self;

    fn add(mut self, rhs: u64) -> Self {
        self += rhs;
        self
    }
}

impl<const BITS: u32> SubAssign<u64> for SequenceNumber<BITS> {
    fn sub_assign(&mut self, rhs: u64) {
        self.n = self.n.wrapping_sub(rhs) & Self::MASK;
    }
}

impl<const BITS: u32> Sub<u64> for SequenceNumber<BITS> {
    type Output = Self;

    fn sub(mut self, rhs: u64) -> Self {
        self -= rhs;
        self
    }
}

impl<const BITS: u32> fmt::Display for SequenceNumber<BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.n)
    }
}
