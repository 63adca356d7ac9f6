//! 发送端状态机
//!
//! 链路的比分源一侧：比分变化立即发出，纠正回显旧比分的接收端，
//! 未连接时周期性广播，并负责发起 id 握手：
//!
//! ```text
//!  未知数据包 ──▶ 提议候选 C ──▶ 回显 {sender: C, id_change: 旧 id}
//!                    │ (超时)           │
//!                    ▼                  ▼
//!                重新选候选        提交 peer = C
//! ```
//!
//! 调用方通过 [`Sender::poll`] 驱动，单次阻塞不超过配置的处理时限。

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::net::{Connection, LinkStats, Packet, PayloadHex, PeerId, Transport};
use crate::score::Score;
use crate::timer::{ClockHandle, CountdownTimer};

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// 初始接收端地址（握手成功后改为对端实际地址）
    pub receiver_addr: SocketAddr,
    /// 未连接时重发当前比分的间隔
    pub lookout_timeout: Duration,
    /// 候选 id 等待确认的时长
    pub candidate_timeout: Duration,
    /// 连接状态下多久收不到对端消息即判定断开
    pub peer_liveness_timeout: Duration,
    /// 同一比分的纠正重发最小间隔
    pub resend_suppression: Duration,
    /// 单次 poll 处理入站数据报的时间上限
    pub drain_budget: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            receiver_addr: SocketAddr::from(([127, 0, 0, 1], 2520)),
            lookout_timeout: Duration::from_secs(10),
            candidate_timeout: Duration::from_secs(10),
            peer_liveness_timeout: Duration::from_secs(25),
            resend_suppression: Duration::from_millis(350),
            drain_budget: Duration::from_millis(50),
        }
    }
}

pub struct Sender<T> {
    conn: Connection<T>,
    cfg: SenderConfig,
    clock: ClockHandle,
    rng: StdRng,

    peer_addr: SocketAddr,
    candidate_peer_id: PeerId,
    connected: bool,
    current_score: Option<Score>,
    last_score_sent: Option<Score>,

    lookout: CountdownTimer,
    candidate_expiry: CountdownTimer,
    peer_liveness: CountdownTimer,
    resend_suppression: CountdownTimer,
}

impl<T: Transport> Sender<T> {
    pub fn new(transport: T, cfg: SenderConfig, clock: ClockHandle) -> Self {
        Self::with_rng(transport, cfg, clock, StdRng::from_entropy())
    }

    /// 确定性 id，用于测试与可复现的运行
    pub fn with_seed(transport: T, cfg: SenderConfig, clock: ClockHandle, seed: u64) -> Self {
        Self::with_rng(transport, cfg, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(transport: T, cfg: SenderConfig, clock: ClockHandle, mut rng: StdRng) -> Self {
        let my_id = PeerId::random_excluding(&mut rng, &[]);
        let timer = |d: Duration, started: bool| CountdownTimer::new(d, started, Rc::clone(&clock));
        let lookout = timer(cfg.lookout_timeout, true);
        let candidate_expiry = timer(cfg.candidate_timeout, false);
        let peer_liveness = timer(cfg.peer_liveness_timeout, false);
        let resend_suppression = timer(cfg.resend_suppression, true);
        info!(%my_id, receiver = %cfg.receiver_addr, "sender started");
        Self {
            conn: Connection::new(transport, my_id),
            peer_addr: cfg.receiver_addr,
            cfg,
            clock,
            rng,
            candidate_peer_id: PeerId::UNKNOWN,
            connected: false,
            current_score: None,
            last_score_sent: None,
            lookout,
            candidate_expiry,
            peer_liveness,
            resend_suppression,
        }
    }

    pub fn connection(&self) -> &Connection<T> {
        &self.conn
    }

    pub fn stats(&self) -> &LinkStats {
        &self.conn.stats
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// 等待确认的握手候选 id，没有时为 [`PeerId::UNKNOWN`]
    pub fn candidate(&self) -> PeerId {
        self.candidate_peer_id
    }

    /// 比分与广播的目的地址
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn current_score(&self) -> Option<Score> {
        self.current_score
    }

    pub fn last_score_sent(&self) -> Option<Score> {
        self.last_score_sent
    }

    pub fn into_transport(self) -> T {
        self.conn.into_transport()
    }

    /// 提交最新比分并处理所有已到达的数据包。
    ///
    /// 比分变化时立即发送，不受重发抑制限制。
    #[tracing::instrument(skip(self, new_score), fields(my_id = %self.conn.my_id))]
    pub fn poll(&mut self, new_score: Score) {
        if self.current_score != Some(new_score) {
            match self.current_score {
                Some(old) => info!(from = %PayloadHex(&old), to = %PayloadHex(&new_score), "score changed, sending new score"),
                None => info!(to = %PayloadHex(&new_score), "first score, sending"),
            }
            self.current_score = Some(new_score);
            self.send_score();
            self.lookout.reset();
        }

        let mut budget = CountdownTimer::new(self.cfg.drain_budget, true, Rc::clone(&self.clock));
        while self.poll_once() && !budget.just_expired() {}
    }

    fn send_score(&mut self) {
        let Some(score) = self.current_score else {
            return;
        };
        info!(score = %PayloadHex(&score), addr = %self.peer_addr, "sending score");
        self.conn.send(&score, self.peer_addr);
        self.last_score_sent = Some(score);
    }

    /// 一次非阻塞接收并检查计时器，返回是否收到数据包
    fn poll_once(&mut self) -> bool {
        let received = self.conn.receive(Duration::ZERO);
        if let Some((_, addr)) = &received {
            if *addr != self.peer_addr {
                warn!(%addr, expected = %self.peer_addr, "packet from unexpected address");
            }
        }

        self.check_timers();

        let Some((packet, addr)) = received else {
            return false;
        };
        self.handle(packet, addr);
        true
    }

    fn check_timers(&mut self) {
        if self.candidate_expiry.just_expired() {
            info!(candidate = %self.candidate_peer_id, "candidate reply window expired");
            self.candidate_peer_id = PeerId::UNKNOWN;
        }
        if self.peer_liveness.just_expired() {
            info!(peer_id = %self.conn.peer_id, "disconnected, nothing heard from peer");
            self.connected = false;
            self.conn.reset(None, PeerId::UNKNOWN);
            self.candidate_peer_id = PeerId::UNKNOWN;
            self.conn.stats.disconnects += 1;
        }

        if self.connected {
            self.lookout.reset();
        } else if self.lookout.just_expired() {
            info!("sending lookout message");
            self.send_score();
            self.lookout.reset();
        }
    }

    fn handle(&mut self, packet: Packet, addr: SocketAddr) {
        let me = self.conn.my_id;
        if packet.sender == self.conn.peer_id && !self.conn.peer_id.is_unknown() && packet.receiver == me {
            self.on_in_band(&packet);
        } else if packet.sender == self.candidate_peer_id
            && !self.candidate_peer_id.is_unknown()
            && packet.receiver == me
            && packet.has_id_change()
        {
            self.on_confirm(addr);
        } else {
            self.on_discovery(&packet, addr);
        }
    }

    fn on_in_band(&mut self, packet: &Packet) {
        if !self.conn.accept(packet.sequence_number) {
            return;
        }
        self.peer_liveness.reset();
        debug!(seq = %packet.sequence_number, "good packet");

        let Some(score) = self.current_score else {
            return;
        };
        if packet.payload == score {
            return;
        }
        info!(echoed = %PayloadHex(&packet.payload), "peer holds wrong score");
        if self.last_score_sent != Some(score) || self.resend_suppression.just_expired() {
            self.send_score();
            self.resend_suppression.reset();
            self.conn.stats.resends += 1;
        } else {
            info!("not resending, duplicate within suppression window");
            self.conn.stats.resends_suppressed += 1;
        }
    }

    fn on_confirm(&mut self, addr: SocketAddr) {
        let peer = self.candidate_peer_id;
        self.conn.reset(None, peer);
        self.candidate_peer_id = PeerId::UNKNOWN;
        self.candidate_expiry.stop();
        self.peer_addr = addr;
        info!(peer_id = %peer, %addr, "switching connection to new receiver");
        self.send_score();
        self.connected = true;
        self.peer_liveness.reset();
        self.last_score_sent = None;
        self.conn.stats.handshakes += 1;
    }

    fn on_discovery(&mut self, packet: &Packet, addr: SocketAddr) {
        if self.candidate_peer_id.is_unknown() {
            self.candidate_expiry.reset();
            self.candidate_peer_id = PeerId::random_excluding(&mut self.rng, &[self.conn.peer_id]);
            info!(candidate = %self.candidate_peer_id, "generated candidate id");
        }
        info!(candidate = %self.candidate_peer_id, to = %packet.sender, %addr, "proposing id change");
        self.conn.send_id_change_response(packet, self.candidate_peer_id, addr);
        self.last_score_sent = None;
    }
}
