//! 七段数码管显示
//!
//! 记分牌共 9 位数字，分 4 组：总分 (3)、出局数 (1)、轮数 (2)、首局总分 (3)。
//! 每组的前导零可以消隐，未用的数位保持熄灭。

use std::fmt;

use super::{Score, ScoreError};
use crate::net::PAYLOAD_SIZE;

/// 每组位数，从左到右
pub const DIGIT_GROUPS: [usize; 4] = [3, 1, 2, 3];

/// 数字 0-9 的段码
pub const SEGMENT_CODES: [u8; 10] = [0x7e, 0x30, 0x6d, 0x79, 0x33, 0x5b, 0x1f, 0x70, 0x7f, 0x73];

/// 消隐数位的段码
pub const BLANK: u8 = 0x00;

/// 表示从未写入的段码
pub(crate) const UNLIT: u8 = 0x08;

/// 校验比分并消隐前导零，`None` 表示空白数位
pub fn digits(score: &Score, blank_leading_zeroes: bool) -> Result<[Option<u8>; PAYLOAD_SIZE], ScoreError> {
    let mut out = [None; PAYLOAD_SIZE];
    for (i, (&v, slot)) in score.iter().zip(out.iter_mut()).enumerate() {
        if usize::from(v) >= SEGMENT_CODES.len() {
            return Err(ScoreError::InvalidDigit { index: i, value: v });
        }
        *slot = Some(v);
    }
    if blank_leading_zeroes {
        let mut start = 0;
        for len in DIGIT_GROUPS {
            for d in &mut out[start..start + len] {
                if *d != Some(0) {
                    break;
                }
                *d = None;
            }
            start += len;
        }
    }
    Ok(out)
}

/// `score` 每一位的段码
pub fn render(score: &Score, blank_leading_zeroes: bool) -> Result<[u8; PAYLOAD_SIZE], ScoreError> {
    let digits = digits(score, blank_leading_zeroes)?;
    Ok(digits.map(code_for))
}

pub fn code_for(digit: Option<u8>) -> u8 {
    match digit {
        Some(d) => SEGMENT_CODES[usize::from(d)],
        None => BLANK,
    }
}

/// 按记分牌的样子显示数字，如 `" 12|3| 4| 56"`，组间以 `|` 分隔
pub struct DigitsText<'a>(pub &'a [Option<u8>; PAYLOAD_SIZE]);

impl fmt::Display for DigitsText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut start = 0;
        for (g, len) in DIGIT_GROUPS.into_iter().enumerate() {
            if g > 0 {
                f.write_str("|")?;
            }
            for d in &self.0[start..start + len] {
                match d {
                    Some(d) => write!(f, "{d}")?,
                    None => f.write_str(" ")?,
                }
            }
            start += len;
        }
        Ok(())
    }
}
