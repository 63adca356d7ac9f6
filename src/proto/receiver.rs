//! 接收端状态机
//!
//! 链路的显示一侧。每次 [`Receiver::tick`] 最多等待一个数据报：
//! 带内比分变化写入显示端并回显；id 提议被采用并确认；
//! 其余数据包一律回复本端信息，以便发送端开始发现流程。

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::net::{Connection, LinkStats, PAYLOAD_SIZE, Packet, PayloadHex, PeerId, Transport};
use crate::score::{Score, ScoreSink};
use crate::timer::{ClockHandle, CountdownTimer};

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// 单次接收的最长等待
    pub receive_timeout: Duration,
    /// 空闲时向已绑定地址重发当前比分的间隔
    pub lookout_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(5000),
            lookout_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Receiver<T, K> {
    conn: Connection<T>,
    cfg: ReceiverConfig,
    sink: K,
    bound_address: Option<SocketAddr>,
    current_score: Score,
    lookout: CountdownTimer,
}

impl<T: Transport, K: ScoreSink> Receiver<T, K> {
    pub fn new(transport: T, sink: K, cfg: ReceiverConfig, clock: ClockHandle) -> Self {
        Self::with_rng(transport, sink, cfg, clock, StdRng::from_entropy())
    }

    pub fn with_seed(transport: T, sink: K, cfg: ReceiverConfig, clock: ClockHandle, seed: u64) -> Self {
        Self::with_rng(transport, sink, cfg, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(transport: T, sink: K, cfg: ReceiverConfig, clock: ClockHandle, mut rng: StdRng) -> Self {
        let my_id = PeerId::random_excluding(&mut rng, &[]);
        let lookout = CountdownTimer::new(cfg.lookout_timeout, true, Rc::clone(&clock));
        info!(%my_id, "receiver started");
        Self {
            conn: Connection::new(transport, my_id),
            cfg,
            sink,
            bound_address: None,
            current_score: [0; PAYLOAD_SIZE],
            lookout,
        }
    }

    pub fn connection(&self) -> &Connection<T> {
        &self.conn
    }

    pub fn stats(&self) -> &LinkStats {
        &self.conn.stats
    }

    pub fn bound_address(&self) -> Option<SocketAddr> {
        self.bound_address
    }

    pub fn current_score(&self) -> Score {
        self.current_score
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (T, K) {
        (self.conn.into_transport(), self.sink)
    }

    /// 单次循环，返回是否处理了数据包
    #[tracing::instrument(skip(self), fields(my_id = %self.conn.my_id))]
    pub fn tick(&mut self) -> bool {
        let Some((packet, addr)) = self.conn.receive(self.cfg.receive_timeout) else {
            self.on_idle();
            return false;
        };
        info!(%packet, %addr, "received packet");
        if self.bound_address != Some(addr) {
            info!(%addr, old = ?self.bound_address, "packet from new address");
        }
        self.handle(packet, addr);
        true
    }

    /// 持续 tick，直到 `stop` 返回 true
    pub fn run(&mut self, mut stop: impl FnMut(&Self) -> bool) {
        while !stop(self) {
            self.tick();
        }
    }

    fn on_idle(&mut self) {
        if !self.lookout.just_expired() {
            return;
        }
        self.lookout.reset();
        match self.bound_address {
            Some(addr) => {
                info!(%addr, "sending lookout message");
                let score = self.current_score;
                self.conn.send(&score, addr);
            }
            None => debug!("no bound address, not sending lookout message"),
        }
    }

    fn handle(&mut self, packet: Packet, addr: SocketAddr) {
        let me = self.conn.my_id;
        if packet.sender == self.conn.peer_id
            && packet.receiver == me
            && !packet.has_id_change()
            && self.bound_address == Some(addr)
        {
            self.on_in_band(&packet, addr);
        } else if packet.receiver == me && packet.has_id_change() {
            info!(old = %me, new = %packet.id_change, peer = %packet.sender, %addr, "changing id and confirming");
            self.conn.change_id_and_confirm(&packet, addr);
            self.bound_address = Some(addr);
            self.conn.stats.handshakes += 1;
        } else {
            info!(%addr, "unknown packet, sending back my details");
            let score = self.current_score;
            self.conn.send_unbound(&score, addr);
        }
    }

    fn on_in_band(&mut self, packet: &Packet, addr: SocketAddr) {
        if !self.conn.accept(packet.sequence_number) {
            return;
        }
        if packet.payload == self.current_score {
            debug!("same score, no action");
            return;
        }
        self.current_score = packet.payload;
        info!(score = %PayloadHex(&self.current_score), "updating score and echoing");
        self.sink.write(&self.current_score);
        let score = self.current_score;
        self.conn.send(&score, addr);
        self.bound_address = Some(addr);
    }
}
