//! 数据包类型
//!
//! 固定 25 字节的线上格式。编解码不做任何校验，id 与序列号的检查属于连接层。
//!
//! | 偏移 | 长度 | 字段 |
//! |---|---|---|
//! | 0 | 4 | sender |
//! | 4 | 4 | receiver |
//! | 8 | 4 | id_change（0 表示无） |
//! | 12 | 4 | sequence_number |
//! | 16 | 9 | payload |

use std::fmt;

use thiserror::Error;

use super::id::PeerId;
use super::seq::WireSeq;

pub const ID_SIZE: usize = 4;
pub const SEQUENCE_NUMBER_SIZE: usize = 4;
pub const PAYLOAD_SIZE: usize = 9;
pub const PACKET_SIZE: usize = ID_SIZE * 3 + SEQUENCE_NUMBER_SIZE + PAYLOAD_SIZE;

/// 每个数据包携带的应用数据（序列化的记分牌）
pub type Payload = [u8; PAYLOAD_SIZE];

/// id 变更包携带的填充载荷
pub const ID_CHANGE_PAYLOAD: Payload = [0xff; PAYLOAD_SIZE];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("wrong datagram length: expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// 协议数据包
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub sender: PeerId,
    pub receiver: PeerId,
    pub id_change: PeerId,
    pub sequence_number: WireSeq,
    pub payload: Payload,
}

impl Packet {
    /// 数据包：不提出 id 变更
    pub fn data(sender: PeerId, receiver: PeerId, sequence_number: WireSeq, payload: Payload) -> Self {
        Self {
            sender,
            receiver,
            id_change: PeerId::UNKNOWN,
            sequence_number,
            payload,
        }
    }

    /// 握手包：携带 `id_change`，序列号为 0，载荷为填充字节
    pub fn id_change(sender: PeerId, receiver: PeerId, id_change: PeerId) -> Self {
        Self {
            sender,
            receiver,
            id_change,
            sequence_number: WireSeq::new(),
            payload: ID_CHANGE_PAYLOAD,
        }
    }

    /// 由载荷切片构造。
    ///
    /// # Panics
    /// `payload` 长度不等于 [`PAYLOAD_SIZE`] 时 panic（调用方错误）。
    pub fn from_parts(
        sender: PeerId,
        receiver: PeerId,
        id_change: PeerId,
        sequence_number: WireSeq,
        payload: &[u8],
    ) -> Self {
        let payload: Payload = payload.try_into().unwrap_or_else(|_| {
            panic!("payload must be {PAYLOAD_SIZE} bytes, got {}", payload.len())
        });
        Self {
            sender,
            receiver,
            id_change,
            sequence_number,
            payload,
        }
    }

    pub fn has_id_change(&self) -> bool {
        !self.id_change.is_unknown()
    }

    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        out[0..4].copy_from_slice(&self.sender.0.to_le_bytes());
        out[4..8].copy_from_slice(&self.receiver.0.to_le_bytes());
        out[8..12].copy_from_slice(&self.id_change.0.to_le_bytes());
        out[12..16].copy_from_slice(&self.sequence_number.to_bytes());
        out[16..].copy_from_slice(&self.payload);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != PACKET_SIZE {
            return Err(DecodeError::WrongLength {
                expected: PACKET_SIZE,
                got: bytes.len(),
            });
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[16..]);
        Ok(Self {
            sender: PeerId(word(0)),
            receiver: PeerId(word(4)),
            id_change: PeerId(word(8)),
            sequence_number: WireSeq::from_raw(word(12) as u64),
            payload,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {} {} {} - {}}}",
            self.sender,
            self.receiver,
            self.id_change,
            self.sequence_number,
            PayloadHex(&self.payload)
        )
    }
}

/// 以空格分隔的大写十六进制字节显示载荷（`01 02 0A`）
pub struct PayloadHex<'a>(pub &'a [u8]);

impl fmt::Display for PayloadHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}
