//! 网络模块
//!
//! 线上格式、序列号、传输层与端点连接记录。本模块不涉及比分与握手。

// 子模块声明
mod connection;
mod id;
mod loopback;
mod packet;
mod seq;
mod stats;
mod transport;

// 重新导出公共接口
pub use connection::Connection;
pub use id::PeerId;
pub use loopback::{Datagram, LoopbackNet, LoopbackTransport};
pub use packet::{
    DecodeError, ID_CHANGE_PAYLOAD, ID_SIZE, PACKET_SIZE, PAYLOAD_SIZE, Packet, Payload, PayloadHex,
    SEQUENCE_NUMBER_SIZE,
};
pub use seq::{SequenceNumber, WireSeq};
pub use stats::LinkStats;
pub use transport::{Transport, UdpTransport};
