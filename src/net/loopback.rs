//! 内存回环网络
//!
//! 每个地址一条队列，所有端点共享。队列为空时接收会在共享时钟上睡满超时，
//! 因此 [`crate::timer::ManualClock`] 的推进方式与阻塞套接字一致。

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use super::packet::Packet;
use super::transport::Transport;
use crate::timer::ClockHandle;

/// 线上看到的一个数据报
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub from: SocketAddr,
    pub to: SocketAddr,
    pub bytes: Vec<u8>,
}

impl Datagram {
    /// 解码为数据包，格式错误时为 `None`
    pub fn packet(&self) -> Option<Packet> {
        Packet::decode(&self.bytes).ok()
    }
}

#[derive(Debug, Default)]
struct NetState {
    queues: HashMap<SocketAddr, VecDeque<(Vec<u8>, SocketAddr)>>,
    down: HashSet<SocketAddr>,
    drop_next: usize,
    sent: Vec<Datagram>,
}

#[derive(Clone)]
pub struct LoopbackNet {
    state: Rc<RefCell<NetState>>,
    clock: ClockHandle,
}

impl LoopbackNet {
    pub fn new(clock: ClockHandle) -> Self {
        Self {
            state: Rc::new(RefCell::new(NetState::default())),
            clock,
        }
    }

    /// 注册 `addr` 并返回绑定到该地址的传输
    pub fn endpoint(&self, addr: SocketAddr) -> LoopbackTransport {
        self.state.borrow_mut().queues.entry(addr).or_default();
        LoopbackTransport {
            addr,
            state: Rc::clone(&self.state),
            clock: Rc::clone(&self.clock),
        }
    }

    /// 以 `from` 的名义向 `to` 投递原始字节，不记入 [`Self::take_sent`]
    pub fn inject(&self, from: SocketAddr, to: SocketAddr, bytes: &[u8]) {
        if let Some(q) = self.state.borrow_mut().queues.get_mut(&to) {
            q.push_back((bytes.to_vec(), from));
        }
    }

    pub fn inject_packet(&self, from: SocketAddr, to: SocketAddr, packet: &Packet) {
        self.inject(from, to, &packet.encode());
    }

    /// 断开期间发往 `addr` 的数据报会被静默丢弃
    pub fn set_down(&self, addr: SocketAddr, down: bool) {
        let mut st = self.state.borrow_mut();
        if down {
            st.down.insert(addr);
        } else {
            st.down.remove(&addr);
        }
    }

    /// 丢弃接下来任意端点发出的 `n` 个数据报
    pub fn drop_next(&self, n: usize) {
        self.state.borrow_mut().drop_next = n;
    }

    /// 发往 `addr` 且尚未被接收的数据报数
    pub fn pending(&self, addr: SocketAddr) -> usize {
        self.state.borrow().queues.get(&addr).map_or(0, VecDeque::len)
    }

    /// 清空 `addr` 的队列
    pub fn flush(&self, addr: SocketAddr) {
        if let Some(q) = self.state.borrow_mut().queues.get_mut(&addr) {
            q.clear();
        }
    }

    /// 取出迄今发送的全部数据报记录（含被丢弃的）
    pub fn take_sent(&self) -> Vec<Datagram> {
        std::mem::take(&mut self.state.borrow_mut().sent)
    }
}

/// [`LoopbackNet`] 上的一个端点
pub struct LoopbackTransport {
    addr: SocketAddr,
    state: Rc<RefCell<NetState>>,
    clock: ClockHandle,
}

impl LoopbackTransport {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for LoopbackTransport {
    fn recv_from(&mut self, timeout: Duration) -> Option<(Vec<u8>, SocketAddr)> {
        let next = self
            .state
            .borrow_mut()
            .queues
            .get_mut(&self.addr)
            .and_then(VecDeque::pop_front);
        if next.is_none() {
            self.clock.sleep(timeout);
        }
        next
    }

    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> bool {
        let mut st = self.state.borrow_mut();
        st.sent.push(Datagram {
            from: self.addr,
            to: addr,
            bytes: bytes.to_vec(),
        });
        if st.drop_next > 0 {
            st.drop_next -= 1;
            return true;
        }
        if st.down.contains(&addr) {
            return true;
        }
        let from = self.addr;
        if let Some(q) = st.queues.get_mut(&addr) {
            q.push_back((bytes.to_vec(), from));
        }
        true
    }
}
