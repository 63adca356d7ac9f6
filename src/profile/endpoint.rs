//! 套接字端点
//!
//! 延迟绑定的 UDP 套接字，生命周期由 `init` / `close` 显式控制。

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{info, warn};

use super::ProfileError;
use crate::net::{Transport, UdpTransport};
use crate::timer::ClockHandle;

/// 在 [`SocketEndpoint::init`] 时绑定、在 [`SocketEndpoint::close`] 时释放的 UDP 端点。
///
/// 作为 [`Transport`] 使用时，关闭状态下表现为一条不通的链路：
/// 接收在共享时钟上等满超时后返回 `None`，发送返回 `false`。
pub struct SocketEndpoint {
    bind_addr: SocketAddr,
    socket: Option<UdpTransport>,
    clock: ClockHandle,
}

impl SocketEndpoint {
    /// 不做任何 I/O，直到调用 [`Self::init`]。
    pub fn new(bind_addr: SocketAddr, clock: ClockHandle) -> Self {
        Self {
            bind_addr,
            socket: None,
            clock,
        }
    }

    /// 绑定套接字；已打开时重复调用不做任何事。
    pub fn init(&mut self) -> Result<(), ProfileError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let sock = UdpTransport::bind(self.bind_addr).map_err(|source| ProfileError::Bind {
            addr: self.bind_addr,
            source,
        })?;
        let local = sock.local_addr().unwrap_or(self.bind_addr);
        info!(addr = %local, "socket bound");
        self.socket = Some(sock);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            info!(addr = %self.bind_addr, "closing socket");
        }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// 实际绑定地址（端口 0 会被解析），关闭时为 `None`
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Transport for SocketEndpoint {
    fn recv_from(&mut self, timeout: Duration) -> Option<(Vec<u8>, SocketAddr)> {
        match self.socket.as_mut() {
            Some(s) => s.recv_from(timeout),
            None => {
                warn!("receive on closed endpoint");
                self.clock.sleep(timeout);
                None
            }
        }
    }

    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> bool {
        match self.socket.as_mut() {
            Some(s) => s.send_to(bytes, addr),
            None => {
                warn!(%addr, "send on closed endpoint");
                false
            }
        }
    }
}

impl Drop for SocketEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}
