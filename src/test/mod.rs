use std::net::SocketAddr;
use std::rc::Rc;

use crate::timer::{ClockHandle, ManualClock};

mod connection;
mod packet;
mod timer;

pub(crate) fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// A manual clock plus the same clock as a shareable handle.
pub(crate) fn manual_clock() -> (Rc<ManualClock>, ClockHandle) {
    let clock = ManualClock::new();
    let handle: ClockHandle = clock.clone();
    (clock, handle)
}
