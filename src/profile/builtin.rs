//! 内置配置档案

use super::{ProfileSet, ReceiverProfileSpec, ScoreSinkSpec, ScoreSourceSpec, SenderProfileSpec};

pub const RECEIVER_LISTEN_PORT: u16 = 2520;
pub const SENDER_LISTEN_PORT: u16 = 2521;
/// 记分牌在其自带热点上的地址
pub const RECEIVER_IP: &str = "192.168.4.1";

pub(super) fn profiles() -> ProfileSet {
    let mut set = ProfileSet::default();
    let local_receiver = format!("127.0.0.1:{RECEIVER_LISTEN_PORT}");
    let sender_bind = format!("0.0.0.0:{SENDER_LISTEN_PORT}");

    set.senders.insert(
        "test_sender",
        SenderProfileSpec {
            receiver_addr: Some(local_receiver.clone()),
            bind_addr: Some(sender_bind.clone()),
            lookout_timeout_ms: Some(10_000),
            tick_ms: Some(3_000),
            candidate_timeout_ms: Some(10_000),
            peer_liveness_timeout_ms: Some(25_000),
            resend_suppression_ms: Some(350),
            score_source: Some(ScoreSourceSpec::Generator { seed: None }),
            ..Default::default()
        },
    );
    set.senders.insert(
        "sender_base",
        SenderProfileSpec {
            template: true,
            receiver_addr: Some(format!("{RECEIVER_IP}:{RECEIVER_LISTEN_PORT}")),
            bind_addr: Some(sender_bind),
            lookout_timeout_ms: Some(10_000),
            tick_ms: Some(2_000),
            candidate_timeout_ms: Some(10_000),
            peer_liveness_timeout_ms: Some(45_000),
            resend_suppression_ms: Some(500),
            ..Default::default()
        },
    );
    set.senders.insert(
        "test_sender_excel",
        SenderProfileSpec {
            based_on: Some("sender_base".to_string()),
            receiver_addr: Some(local_receiver),
            tick_ms: Some(0),
            peer_liveness_timeout_ms: Some(35_000),
            score_source: Some(ScoreSourceSpec::Generator { seed: None }),
            ..Default::default()
        },
    );

    set.receivers.insert(
        "receiver_base",
        ReceiverProfileSpec {
            template: true,
            bind_addr: Some(format!("0.0.0.0:{RECEIVER_LISTEN_PORT}")),
            receive_timeout_ms: Some(5_000),
            ..Default::default()
        },
    );
    set.receivers.insert(
        "test_receiver",
        ReceiverProfileSpec {
            based_on: Some("receiver_base".to_string()),
            lookout_timeout_ms: Some(10_000),
            score_sink: Some(ScoreSinkSpec::Printer),
            ..Default::default()
        },
    );
    set.receivers.insert(
        "receiver_segments",
        ReceiverProfileSpec {
            based_on: Some("receiver_base".to_string()),
            lookout_timeout_ms: Some(20_000),
            score_sink: Some(ScoreSinkSpec::Segments),
            ..Default::default()
        },
    );
    set
}
