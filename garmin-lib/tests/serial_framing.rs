//! Wire-level tests for the serial DLE/ETX framing.

use garmin_lib::packet::Packet;
use garmin_lib::serial::{checksum, deframe, escape, frame, unescape};

#[test]
fn ack_frame_matches_known_wire_bytes() {
    // An ACK for packet id 10: DLE, id 6, size 2, data 0a 00, checksum,
    // DLE, ETX. Captured from a real exchange.
    let wire = hex::decode("1006020a00ee1003").unwrap();
    assert_eq!(frame(6, &[0x0a, 0x00]).unwrap(), wire);
    let packet = deframe(&wire).unwrap();
    assert_eq!(packet, Packet::new(6, vec![0x0a, 0x00]));
    assert_eq!(packet.as_uint(), Some(10));
}

#[test]
fn dle_payload_is_stuffed_and_recovered() {
    // Packet id 0x10 carrying the bytes 10 03: every DLE in the body is
    // doubled, the lone DLEs only mark the packet boundaries.
    let wire = frame(0x10, &[0x10, 0x03]).unwrap();
    assert_eq!(wire, hex::decode("101002101003db1003").unwrap());
    assert_eq!(deframe(&wire).unwrap(), Packet::new(0x10, vec![0x10, 0x03]));
}

#[test]
fn every_dle_in_escaped_body_comes_in_pairs() {
    let data: Vec<u8> = vec![0x10, 0x00, 0x10, 0x10, 0x7f];
    let escaped = escape(&data);
    let mut run = 0usize;
    for &byte in &escaped {
        if byte == 0x10 {
            run += 1;
        } else {
            assert_eq!(run % 2, 0, "odd DLE run before {byte:#04x}");
            run = 0;
        }
    }
    assert_eq!(run % 2, 0);
    assert_eq!(unescape(&escaped), data);
}

#[test]
fn checksum_edge_values_are_accepted() {
    // A body summing to a multiple of 256 yields checksum 0x00.
    let zero = frame(0x80, &[0x7e, 0x00]).unwrap(); // 0x80 + 0x02 + 0x7e = 0x100
    assert_eq!(zero[zero.len() - 3], 0x00);
    assert_eq!(deframe(&zero).unwrap(), Packet::new(0x80, vec![0x7e, 0x00]));

    // A body summing to 1 yields checksum 0xFF.
    let ff = frame(0x23, &[0xdd]).unwrap(); // 0x23 + 0x01 + 0xdd = 0x101
    assert_eq!(ff[ff.len() - 3], 0xff);
    assert_eq!(deframe(&ff).unwrap(), Packet::new(0x23, vec![0xdd]));
}

#[test]
fn maximum_payload_is_255_bytes() {
    let data: Vec<u8> = (0u8..=255).map(|i| i.wrapping_mul(7)).take(255).collect();
    let wire = frame(35, &data).unwrap();
    assert_eq!(deframe(&wire).unwrap(), Packet::new(35, data));
    assert!(frame(35, &[0u8; 256]).is_err());
}

#[test]
fn corrupted_frames_are_rejected() {
    let mut wire = frame(10, &[0x07, 0x00]).unwrap();
    let n = wire.len();
    wire[n - 3] = wire[n - 3].wrapping_add(1);
    assert!(deframe(&wire).is_err());

    // Truncated frame.
    let wire = frame(10, &[0x07, 0x00]).unwrap();
    assert!(deframe(&wire[..4]).is_err());
}

#[test]
fn checksum_is_modulo_256_twos_complement() {
    assert_eq!(checksum([0u8; 0]), 0);
    assert_eq!(checksum([1]), 0xff);
    assert_eq!(checksum([0xff, 0x01]), 0);
    assert_eq!(checksum([0x06, 0x02, 0x0a, 0x00]), 0xee);
}
