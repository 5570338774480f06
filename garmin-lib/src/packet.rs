use bytes::Bytes;

/// A link-layer packet: a packet id plus its payload.
///
/// Serial links carry ids 0..=255, USB links 0..=65535. The payload is
/// opaque at this level; most command packets carry a 16-bit little-endian
/// command code, transfer packets carry a record encoded by one of the
/// negotiated datatype schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: u16,
    pub data: Bytes,
}

impl Packet {
    pub fn new(id: u16, data: impl Into<Bytes>) -> Self {
        Packet { id, data: data.into() }
    }

    /// A packet with no payload.
    pub fn empty(id: u16) -> Self {
        Packet { id, data: Bytes::new() }
    }

    /// A packet whose payload is a 16-bit little-endian value, the encoding
    /// used for command codes and record counts.
    pub fn with_u16(id: u16, value: u16) -> Self {
        Packet {
            id,
            data: Bytes::copy_from_slice(&value.to_le_bytes()),
        }
    }

    /// Decode the payload as a little-endian unsigned integer of up to
    /// 8 bytes. Shorter payloads are zero-extended, the way devices encode
    /// command echoes and record counts.
    pub fn as_uint(&self) -> Option<u64> {
        if self.data.len() > 8 {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..self.data.len()].copy_from_slice(&self.data);
        Some(u64::from_le_bytes(buf))
    }

    /// Decode the payload as a 16-bit little-endian command code.
    pub fn command_code(&self) -> Option<u16> {
        match *self.data {
            [lo, hi, ..] => Some(u16::from_le_bytes([lo, hi])),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_payload_is_little_endian() {
        let p = Packet::with_u16(10, 0x0102);
        assert_eq!(&p.data[..], &[0x02, 0x01]);
        assert_eq!(p.command_code(), Some(0x0102));
    }

    #[test]
    fn uint_zero_extends_short_payloads() {
        let p = Packet::new(38, vec![0x2a]);
        assert_eq!(p.as_uint(), Some(0x2a));
        assert_eq!(Packet::empty(6).as_uint(), Some(0));
    }
}
