//! 协议模块
//!
//! 两端的状态机。二者只通过线路通信，
//! [`sender::Sender`] 与 [`receiver::Receiver`] 之间没有共享状态。

pub mod receiver;
pub mod sender;

pub use receiver::{Receiver, ReceiverConfig};
pub use sender::{Sender, SenderConfig};
