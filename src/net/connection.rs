//! 连接记录
//!
//! 两个状态机共用的端点记录：本端 id、已绑定的对端 id、两个序列号计数器，
//! 以及据此给数据包打戳和校验的收发操作。

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, warn};

use super::id::PeerId;
use super::packet::{Packet, Payload, PayloadHex};
use super::seq::WireSeq;
use super::stats::LinkStats;
use super::transport::Transport;

pub struct Connection<T> {
    transport: T,
    pub my_id: PeerId,
    /// 已绑定的对端 id，协商前为 [`PeerId::UNKNOWN`]
    pub peer_id: PeerId,
    pub next_remote_seq: WireSeq,
    pub next_local_seq: WireSeq,
    pub stats: LinkStats,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, my_id: PeerId) -> Self {
        Self {
            transport,
            my_id,
            peer_id: PeerId::UNKNOWN,
            next_remote_seq: WireSeq::new(),
            next_local_seq: WireSeq::new(),
            stats: LinkStats::default(),
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// 接收一个数据包。长度错误的数据报记日志后丢弃，对调用方而言等同于超时。
    pub fn receive(&mut self, timeout: Duration) -> Option<(Packet, SocketAddr)> {
        let (bytes, addr) = self.transport.recv_from(timeout)?;
        match Packet::decode(&bytes) {
            Ok(packet) => {
                self.stats.received += 1;
                debug!(%packet, %addr, "received");
                Some((packet, addr))
            }
            Err(e) => {
                self.stats.malformed += 1;
                warn!(%addr, error = %e, data = %PayloadHex(&bytes), "discarding malformed datagram");
                None
            }
        }
    }

    /// 以下一个本地序列号发送 `payload` 给已绑定的对端
    pub fn send(&mut self, payload: &Payload, addr: SocketAddr) -> bool {
        let seq = self.next_local_seq.post_increment();
        let packet = Packet::data(self.my_id, self.peer_id, seq, *payload);
        self.transmit(&packet, addr)
    }

    /// 与 [`Self::send`] 相同，但接收方 id 为未知，促使对端开始发现流程
    pub fn send_unbound(&mut self, payload: &Payload, addr: SocketAddr) -> bool {
        let seq = self.next_local_seq.post_increment();
        let packet = Packet::data(self.my_id, PeerId::UNKNOWN, seq, *payload);
        self.transmit(&packet, addr)
    }

    /// 向 `originating` 的发送方提议 `proposed_id`，不消耗序列号
    pub fn send_id_change_response(&mut self, originating: &Packet, proposed_id: PeerId, addr: SocketAddr) -> bool {
        let packet = Packet::id_change(self.my_id, originating.sender, proposed_id);
        self.transmit(&packet, addr)
    }

    /// 采用 `proposal` 中提议的 id，绑定其发送方为对端，
    /// 并在 `id_change` 字段回显旧 id 作为确认
    pub fn change_id_and_confirm(&mut self, proposal: &Packet, addr: SocketAddr) -> bool {
        let old_id = self.my_id;
        self.reset(Some(proposal.id_change), proposal.sender);
        let packet = Packet::id_change(self.my_id, proposal.sender, old_id);
        self.transmit(&packet, addr)
    }

    /// 绑定新的对端（或不绑定），两个序列号计数器归零
    pub fn reset(&mut self, new_my_id: Option<PeerId>, new_peer_id: PeerId) {
        if let Some(id) = new_my_id {
            self.my_id = id;
        }
        self.peer_id = new_peer_id;
        self.next_remote_seq = WireSeq::new();
        self.next_local_seq = WireSeq::new();
    }

    /// 序列号不早于期望值时接受
    pub fn accept(&mut self, seq: WireSeq) -> bool {
        if seq >= self.next_remote_seq {
            self.next_remote_seq = seq + 1;
            true
        } else {
            self.stats.duplicates += 1;
            debug!(%seq, expected = %self.next_remote_seq, "old/duplicate packet");
            false
        }
    }

    fn transmit(&mut self, packet: &Packet, addr: SocketAddr) -> bool {
        debug!(%packet, %addr, "sending");
        let ok = self.transport.send_to(&packet.encode(), addr);
        if ok {
            self.stats.sent += 1;
        } else {
            self.stats.send_failures += 1;
        }
        ok
    }
}
