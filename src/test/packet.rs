use crate::net::{DecodeError, ID_CHANGE_PAYLOAD, PACKET_SIZE, Packet, PayloadHex, PeerId, WireSeq};

fn sample() -> Packet {
    Packet::data(
        PeerId(0x0403_0201),
        PeerId(0x0807_0605),
        WireSeq::from_raw(0x1009_0c0b),
        [1, 2, 3, 4, 5, 6, 7, 8, 9],
    )
}

#[test]
fn packet_encode_lays_out_little_endian_fields() {
    let bytes = sample().encode();
    assert_eq!(bytes.len(), PACKET_SIZE);
    assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
    assert_eq!(&bytes[4..8], &[5, 6, 7, 8]);
    assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
    assert_eq!(&bytes[12..16], &[0x0b, 0x0c, 0x09, 0x10]);
    assert_eq!(&bytes[16..], &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn packet_decode_recovers_every_field() {
    let mut bytes = sample().encode();
    bytes[8] = 0x2a;
    let p = Packet::decode(&bytes).expect("valid length");
    assert_eq!(p.sender, PeerId(0x0403_0201));
    assert_eq!(p.receiver, PeerId(0x0807_0605));
    assert_eq!(p.id_change, PeerId(0x2a));
    assert!(p.has_id_change());
    assert_eq!(p.sequence_number, WireSeq::from_raw(0x1009_0c0b));
    assert_eq!(p.payload, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(Packet::decode(&p.encode()), Ok(p));
}

#[test]
fn packet_decode_inverts_encode_at_field_extremes() {
    let max = PeerId(u32::MAX);
    let top = WireSeq::from_raw(u32::MAX as u64);
    let cases = [
        Packet::data(max, max, top, [0xff; 9]),
        Packet::data(PeerId::UNKNOWN, PeerId::UNKNOWN, WireSeq::new(), [0; 9]),
        Packet::from_parts(max, PeerId(1), max, top, &[0x80; 9]),
        Packet::id_change(max, PeerId::UNKNOWN, max),
    ];
    for p in cases {
        let bytes = p.encode();
        assert_eq!(Packet::decode(&bytes), Ok(p), "{p}");
    }
    assert_eq!(&Packet::data(max, max, top, [0; 9]).encode()[..16], &[0xff; 16]);
}

#[test]
fn packet_decode_rejects_wrong_lengths() {
    let bytes = sample().encode();
    assert_eq!(
        Packet::decode(&bytes[..24]),
        Err(DecodeError::WrongLength { expected: 25, got: 24 })
    );
    let mut long = bytes.to_vec();
    long.push(0);
    assert_eq!(
        Packet::decode(&long),
        Err(DecodeError::WrongLength { expected: 25, got: 26 })
    );
    assert!(Packet::decode(&[]).is_err());
}

#[test]
fn packet_id_change_uses_seq_zero_and_filler_payload() {
    let p = Packet::id_change(PeerId(7), PeerId(9), PeerId(11));
    assert_eq!(p.sequence_number, WireSeq::new());
    assert_eq!(p.payload, ID_CHANGE_PAYLOAD);
    assert_eq!(p.id_change, PeerId(11));
    assert!(!sample().has_id_change());
}

#[test]
fn packet_from_parts_accepts_exact_payload() {
    let p = Packet::from_parts(PeerId(1), PeerId(2), PeerId::UNKNOWN, WireSeq::from_raw(5), &[0; 9]);
    assert_eq!(p.payload, [0; 9]);
}

#[test]
#[should_panic(expected = "payload must be 9 bytes")]
fn packet_from_parts_panics_on_short_payload() {
    let _ = Packet::from_parts(PeerId(1), PeerId(2), PeerId::UNKNOWN, WireSeq::new(), &[0; 8]);
}

#[test]
fn packet_displays_fields_and_hex_payload() {
    let p = Packet::data(PeerId(5), PeerId(6), WireSeq::from_raw(3), [0, 1, 0x0a, 0xff, 0, 0, 0, 0, 0x10]);
    assert_eq!(p.to_string(), "{5 6 0 3 - 00 01 0A FF 00 00 00 00 10}");
    assert_eq!(PayloadHex(&[]).to_string(), "");
}
