//! 数据报传输
//!
//! 连接层使用的不可靠数据报链路。

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, warn};

/// 足够大，超长数据报会被完整读到并拒绝，而不是被截断
const MAX_DATAGRAM: usize = 512;

/// 不可靠、无序的数据报链路。
///
/// 故障不会以错误形式返回：接收失败或超时为 `None`，发送失败为 `false`。
pub trait Transport {
    /// 最多等待 `timeout` 接收一个数据报；超时为零时只检查已排队的数据
    fn recv_from(&mut self, timeout: Duration) -> Option<(Vec<u8>, SocketAddr)>;

    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    NonBlocking,
    Timeout(Duration),
}

/// 基于已绑定 [`UdpSocket`] 的 [`Transport`]
#[derive(Debug)]
pub struct UdpTransport {
    sock: UdpSocket,
    wait: Option<Wait>,
}

impl UdpTransport {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let sock = UdpSocket::bind(addr)?;
        Ok(Self { sock, wait: None })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    fn set_wait(&mut self, timeout: Duration) -> io::Result<()> {
        let wait = if timeout.is_zero() {
            Wait::NonBlocking
        } else {
            Wait::Timeout(timeout)
        };
        if self.wait == Some(wait) {
            return Ok(());
        }
        match wait {
            Wait::NonBlocking => self.sock.set_nonblocking(true)?,
            Wait::Timeout(t) => {
                self.sock.set_nonblocking(false)?;
                self.sock.set_read_timeout(Some(t))?;
            }
        }
        self.wait = Some(wait);
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn recv_from(&mut self, timeout: Duration) -> Option<(Vec<u8>, SocketAddr)> {
        if let Err(e) = self.set_wait(timeout) {
            warn!(error = %e, "failed to configure socket wait");
            return None;
        }
        let mut buf = [0u8; MAX_DATAGRAM];
        match self.sock.recv_from(&mut buf) {
            Ok((n, addr)) => Some((buf[..n].to_vec(), addr)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => None,
            // 之前发送引起的 ICMP 端口不可达：对端尚未启动
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset) => {
                debug!(error = %e, "peer unreachable");
                None
            }
            Err(e) => {
                warn!(error = %e, "udp receive error");
                None
            }
        }
    }

    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> bool {
        match self.sock.send_to(bytes, addr) {
            Ok(n) if n == bytes.len() => true,
            Ok(n) => {
                warn!(%addr, sent = n, len = bytes.len(), "short udp send");
                false
            }
            Err(e) => {
                warn!(%addr, error = %e, "udp send error");
                false
            }
        }
    }
}
