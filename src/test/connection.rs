use std::time::Duration;

use super::{addr, manual_clock};
use crate::net::{Connection, ID_CHANGE_PAYLOAD, LoopbackNet, Packet, PeerId, WireSeq};

#[test]
fn connection_send_stamps_ids_and_consecutive_seqs() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let (a, b) = (addr(1), addr(2));
    let _peer = net.endpoint(b);
    let mut conn = Connection::new(net.endpoint(a), PeerId(10));
    conn.peer_id = PeerId(20);

    assert!(conn.send(&[1; 9], b));
    assert!(conn.send(&[2; 9], b));
    assert!(conn.send_unbound(&[3; 9], b));

    let sent: Vec<Packet> = net.take_sent().iter().filter_map(|d| d.packet()).collect();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0], Packet::data(PeerId(10), PeerId(20), WireSeq::from_raw(0), [1; 9]));
    assert_eq!(sent[1], Packet::data(PeerId(10), PeerId(20), WireSeq::from_raw(1), [2; 9]));
    assert_eq!(sent[2], Packet::data(PeerId(10), PeerId::UNKNOWN, WireSeq::from_raw(2), [3; 9]));
    assert_eq!(conn.next_local_seq, WireSeq::from_raw(3));
    assert_eq!(conn.stats.sent, 3);
}

#[test]
fn connection_receive_drops_malformed_datagrams() {
    let (clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let (a, b) = (addr(1), addr(2));
    let mut conn = Connection::new(net.endpoint(a), PeerId(10));

    net.inject(b, a, &[0u8; 24]);
    assert!(conn.receive(Duration::ZERO).is_none());
    assert_eq!(conn.stats.malformed, 1);
    assert_eq!(conn.stats.received, 0);

    let p = Packet::data(PeerId(20), PeerId(10), WireSeq::from_raw(4), [7; 9]);
    net.inject_packet(b, a, &p);
    assert_eq!(conn.receive(Duration::ZERO), Some((p, b)));
    assert_eq!(conn.stats.received, 1);

    // An empty queue waits out the timeout on the shared clock.
    assert!(conn.receive(Duration::from_millis(250)).is_none());
    assert_eq!(clock.elapsed(), Duration::from_millis(250));
}

#[test]
fn connection_accept_rejects_old_and_duplicate_seqs() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let mut conn = Connection::new(net.endpoint(addr(1)), PeerId(10));

    assert!(conn.accept(WireSeq::from_raw(0)));
    assert!(conn.accept(WireSeq::from_raw(3)));
    assert_eq!(conn.next_remote_seq, WireSeq::from_raw(4));
    assert!(!conn.accept(WireSeq::from_raw(3)));
    assert!(!conn.accept(WireSeq::from_raw(1)));
    assert_eq!(conn.stats.duplicates, 2);
    assert_eq!(conn.next_remote_seq, WireSeq::from_raw(4));
    assert!(conn.accept(WireSeq::from_raw(4)));
}

#[test]
fn connection_accept_handles_wraparound() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let mut conn = Connection::new(net.endpoint(addr(1)), PeerId(10));
    conn.next_remote_seq = WireSeq::from_raw(u32::MAX as u64);

    assert!(conn.accept(WireSeq::from_raw(u32::MAX as u64)));
    assert_eq!(conn.next_remote_seq, WireSeq::new());
    assert!(conn.accept(WireSeq::from_raw(0)));
    assert!(!conn.accept(WireSeq::from_raw(u32::MAX as u64)));
}

#[test]
fn connection_change_id_and_confirm_rebinds_and_echoes_old_id() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let (a, b) = (addr(1), addr(2));
    let mut conn = Connection::new(net.endpoint(a), PeerId(10));
    conn.next_local_seq = WireSeq::from_raw(5);
    conn.next_remote_seq = WireSeq::from_raw(9);

    let proposal = Packet::id_change(PeerId(20), PeerId(10), PeerId(30));
    assert!(conn.change_id_and_confirm(&proposal, b));

    assert_eq!(conn.my_id, PeerId(30));
    assert_eq!(conn.peer_id, PeerId(20));
    assert_eq!(conn.next_local_seq, WireSeq::new());
    assert_eq!(conn.next_remote_seq, WireSeq::new());

    let sent = net.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, b);
    let confirm = sent[0].packet().expect("valid packet");
    assert_eq!(confirm, Packet::id_change(PeerId(30), PeerId(20), PeerId(10)));
    assert_eq!(confirm.payload, ID_CHANGE_PAYLOAD);
}

#[test]
fn connection_id_change_response_does_not_consume_a_seq() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let mut conn = Connection::new(net.endpoint(addr(1)), PeerId(10));
    let trigger = Packet::data(PeerId(44), PeerId::UNKNOWN, WireSeq::from_raw(8), [0; 9]);

    conn.send_id_change_response(&trigger, PeerId(55), addr(2));

    assert_eq!(conn.next_local_seq, WireSeq::new());
    let sent = net.take_sent();
    assert_eq!(sent[0].packet(), Some(Packet::id_change(PeerId(10), PeerId(44), PeerId(55))));
}

#[test]
fn connection_reset_keeps_my_id_when_not_given() {
    let (_clock, handle) = manual_clock();
    let net = LoopbackNet::new(handle);
    let mut conn = Connection::new(net.endpoint(addr(1)), PeerId(10));
    conn.peer_id = PeerId(3);
    conn.next_local_seq = WireSeq::from_raw(2);

    conn.reset(None, PeerId::UNKNOWN);

    assert_eq!(conn.my_id, PeerId(10));
    assert!(conn.peer_id.is_unknown());
    assert_eq!(conn.next_local_seq, WireSeq::new());
}

#[test]
fn connection_counts_failed_sends() {
    struct Refusing;
    impl crate::net::Transport for Refusing {
        fn recv_from(&mut self, _timeout: Duration) -> Option<(Vec<u8>, std::net::SocketAddr)> {
            None
        }
        fn send_to(&mut self, _bytes: &[u8], _addr: std::net::SocketAddr) -> bool {
            false
        }
    }

    let mut conn = Connection::new(Refusing, PeerId(1));
    assert!(!conn.send(&[0; 9], addr(2)));
    assert_eq!(conn.stats.send_failures, 1);
    assert_eq!(conn.stats.sent, 0);
    // The sequence number is consumed even when the datagram is lost.
    assert_eq!(conn.next_local_seq, WireSeq::from_raw(1));
}
