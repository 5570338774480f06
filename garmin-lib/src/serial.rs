//! Serial physical layer.
//!
//! Implements the RS-232 side of the Garmin physical protocol: DLE/ETX
//! framed packets with byte stuffing, a two's complement checksum, and an
//! ACK/NAK handshake per transmitted packet. The port runs at 9600 8N1
//! until a baud-rate change is negotiated by the transmission protocol.
//!
//! Wire layout of one packet:
//!
//! ```text
//! DLE, ID, SIZE, DATA (0..=255 bytes), CHECKSUM, DLE, ETX
//! ```
//!
//! Any DLE byte inside the SIZE, DATA, or CHECKSUM spans is doubled on the
//! wire; the doubled byte is not part of the size or checksum. Only packet
//! boundaries carry an unpaired DLE.

use crate::error::{GarminError, LinkError, ProtocolError};
use crate::packet::Packet;
use bytes::Bytes;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace};

/// Data Link Escape.
pub const DLE: u8 = 0x10;
/// End of Text.
pub const ETX: u8 = 0x03;
/// Packet id of a positive acknowledgement.
pub const PID_ACK: u16 = 6;
/// Packet id of a negative acknowledgement.
pub const PID_NAK: u16 = 21;

/// Default baud rate every device starts at.
pub const DEFAULT_BAUDRATE: u32 = 9600;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Escape any DLE bytes, aka "DLE stuffing".
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        out.push(byte);
        if byte == DLE {
            out.push(DLE);
        }
    }
    out
}

/// Collapse doubled DLE bytes, aka "DLE unstuffing".
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    while let Some(&byte) = iter.next() {
        out.push(byte);
        if byte == DLE {
            iter.next();
        }
    }
    out
}

/// Two's complement of the modulo-256 sum of `data`.
pub fn checksum(data: impl IntoIterator<Item = u8>) -> u8 {
    let sum = data.into_iter().fold(0u8, u8::wrapping_add);
    sum.wrapping_neg()
}

/// Build the on-wire bytes for one packet.
pub fn frame(pid: u16, data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if pid == 0 || pid > 255 {
        return Err(ProtocolError::PidOutOfRange(pid));
    }
    if data.len() > 255 {
        return Err(ProtocolError::Invalid(format!(
            "serial packet data is limited to 255 bytes, got {}",
            data.len()
        )));
    }
    let pid = pid as u8;
    let size = data.len() as u8;
    let cksum = checksum([pid, size].into_iter().chain(data.iter().copied()));
    let mut packet = vec![DLE, pid];
    packet.extend_from_slice(&escape(&[size]));
    packet.extend_from_slice(&escape(data));
    packet.extend_from_slice(&escape(&[cksum]));
    packet.push(DLE);
    packet.push(ETX);
    Ok(packet)
}

/// Parse the on-wire bytes of one complete packet (as returned by the frame
/// reader) back into a [`Packet`], verifying size and checksum.
pub fn deframe(buffer: &[u8]) -> Result<Packet, LinkError> {
    // Only the size, data, and checksum spans are stuffed, but unescaping
    // the whole frame is harmless: the header DLE is followed by the id.
    let packet = unescape(buffer);
    if packet.len() < 6 {
        return Err(LinkError::Framing("packet too short"));
    }
    let id = packet[1];
    let size = packet[2] as usize;
    let data = &packet[3..packet.len() - 3];
    let cksum = packet[packet.len() - 3];
    if size != data.len() {
        return Err(LinkError::Framing("wrong size of packet data"));
    }
    if cksum != checksum(packet[1..packet.len() - 3].iter().copied()) {
        return Err(LinkError::Checksum);
    }
    Ok(Packet::new(u16::from(id), data.to_vec()))
}

/// The byte stream under the framing layer.
///
/// Tests substitute an in-memory duplex stream for the real port so the
/// ACK/NAK and retry behavior can be exercised against a scripted peer.
enum SerialIo {
    Port(SerialStream),
    #[cfg(test)]
    Sim { stream: tokio::io::DuplexStream, baudrate: u32 },
}

impl SerialIo {
    async fn read_byte(&mut self, limit: Duration) -> Result<u8, LinkError> {
        let mut byte = [0u8; 1];
        let read = match self {
            SerialIo::Port(port) => timeout(limit, port.read(&mut byte)).await??,
            #[cfg(test)]
            SerialIo::Sim { stream, .. } => timeout(limit, stream.read(&mut byte)).await??,
        };
        if read == 0 {
            return Err(LinkError::Framing("unexpected end of stream"));
        }
        Ok(byte[0])
    }

    async fn write_all(&mut self, buffer: &[u8], limit: Duration) -> Result<(), LinkError> {
        match self {
            SerialIo::Port(port) => {
                timeout(limit, port.write_all(buffer)).await??;
                timeout(limit, port.flush()).await??;
            }
            #[cfg(test)]
            SerialIo::Sim { stream, .. } => {
                timeout(limit, stream.write_all(buffer)).await??;
            }
        }
        Ok(())
    }

    fn baudrate(&self) -> u32 {
        match self {
            SerialIo::Port(port) => port.baud_rate().unwrap_or(DEFAULT_BAUDRATE),
            #[cfg(test)]
            SerialIo::Sim { baudrate, .. } => *baudrate,
        }
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), LinkError> {
        match self {
            SerialIo::Port(port) => port.set_baud_rate(baudrate).map_err(|e| {
                LinkError::Io(std::io::Error::other(e))
            }),
            #[cfg(test)]
            SerialIo::Sim { baudrate: b, .. } => {
                *b = baudrate;
                Ok(())
            }
        }
    }
}

/// Serial physical layer over one open port.
pub struct SerialPhysical {
    io: SerialIo,
    timeout: Duration,
    max_retries: u32,
}

impl SerialPhysical {
    /// Open `port` (a device name such as `/dev/ttyUSB0` or `COM1`) at the
    /// default 9600 baud.
    pub fn open(port: &str) -> Result<Self, GarminError> {
        let stream = tokio_serial::new(port, DEFAULT_BAUDRATE)
            .open_native_async()
            .map_err(|e| LinkError::Io(std::io::Error::other(e)))?;
        info!("Opened serial port {port}");
        Ok(SerialPhysical {
            io: SerialIo::Port(stream),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[cfg(test)]
    pub(crate) fn sim(stream: tokio::io::DuplexStream) -> Self {
        SerialPhysical {
            io: SerialIo::Sim { stream, baudrate: DEFAULT_BAUDRATE },
            timeout: Duration::from_millis(200),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn baudrate(&self) -> u32 {
        self.io.baudrate()
    }

    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<(), GarminError> {
        self.io.set_baudrate(baudrate)?;
        Ok(())
    }

    /// Read the raw bytes of one frame.
    ///
    /// Bytes are buffered two at a time, because every DLE occurs in a pair
    /// except at the packet boundaries: a lone DLE opens the packet, DLE DLE
    /// inside the body is one literal DLE, and DLE ETX ends the packet. Any
    /// other DLE-prefixed pair is a framing error.
    async fn read_frame(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut window: Vec<u8> = Vec::with_capacity(2);
        let mut frame: Vec<u8> = Vec::new();
        loop {
            while window.len() < 2 {
                window.push(self.io.read_byte(self.timeout).await?);
            }
            if frame.is_empty() {
                if window[0] == DLE {
                    frame.push(window.remove(0));
                } else {
                    return Err(LinkError::Framing("doesn't start with DLE character"));
                }
            } else if window[0] == DLE {
                if window[1] == DLE {
                    frame.extend_from_slice(&window);
                    window.clear();
                } else if window[1] == ETX {
                    frame.extend_from_slice(&window);
                    break;
                } else {
                    return Err(LinkError::Framing("doesn't end with DLE and ETX character"));
                }
            } else {
                frame.push(window.remove(0));
            }
        }
        Ok(frame)
    }

    /// Read one packet, sending an ACK on success and a NAK on any parse
    /// failure so the peer retransmits. Gives up after the retry budget.
    pub async fn read_packet(&mut self, acknowledge: bool) -> Result<Packet, GarminError> {
        let mut retries = 0;
        loop {
            let result = async {
                let buffer = self.read_frame().await?;
                trace!("> {:02x?}", buffer);
                deframe(&buffer)
            }
            .await;
            match result {
                Ok(packet) => {
                    if acknowledge {
                        self.send_ack(packet.id).await?;
                    }
                    return Ok(packet);
                }
                Err(e) => {
                    info!("{e}");
                    self.send_nak().await?;
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(LinkError::RetriesExceeded.into());
                    }
                }
            }
        }
    }

    /// Send one packet, waiting for the matching ACK unless `acknowledge`
    /// is false. A NAK or a transport error triggers a retransmission, up
    /// to the retry budget.
    pub async fn send_packet(
        &mut self,
        pid: u16,
        data: Bytes,
        acknowledge: bool,
    ) -> Result<(), GarminError> {
        let buffer = frame(pid, &data)?;
        trace!("< {:02x?}", buffer);
        let mut retries = 0;
        loop {
            let result: Result<(), GarminError> = async {
                self.io.write_all(&buffer, self.timeout).await?;
                if acknowledge {
                    self.read_ack(pid).await?;
                }
                Ok(())
            }
            .await;
            match result {
                Ok(()) => return Ok(()),
                Err(GarminError::Link(e)) => {
                    debug!("send failed: {e}");
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(LinkError::RetriesExceeded.into());
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read an ACK/NAK reply for the packet id we just sent.
    ///
    /// NAKs only signal a parse failure on the communications link, never a
    /// higher-layer refusal. A reply that is neither ACK nor NAK leaves the
    /// link in an unknown state and is fatal for the session.
    async fn read_ack(&mut self, pid: u16) -> Result<(), GarminError> {
        debug!("Read ACK/NAK");
        let packet = self.read_packet(false).await?;
        match packet.id {
            PID_ACK => {
                let acked = packet.as_uint().unwrap_or(0) as u16;
                if acked != pid {
                    return Err(ProtocolError::AckMismatch { expected: pid, got: acked }.into());
                }
                Ok(())
            }
            PID_NAK => Err(LinkError::Nak.into()),
            _ => Err(GarminError::Session("received neither ACK nor NAK packet")),
        }
    }

    // ACK and NAK are written directly, outside the acknowledged send path:
    // they are themselves never acknowledged.

    async fn send_ack(&mut self, pid: u16) -> Result<(), GarminError> {
        debug!("Send ACK packet");
        let buffer = frame(PID_ACK, &pid.to_le_bytes())?;
        trace!("< {:02x?}", buffer);
        self.io.write_all(&buffer, self.timeout).await?;
        Ok(())
    }

    /// The NAK carries no packet id: the id of the corrupted packet is
    /// unknown by definition.
    async fn send_nak(&mut self) -> Result<(), GarminError> {
        debug!("Send NAK packet");
        let buffer = frame(PID_NAK, &[])?;
        trace!("< {:02x?}", buffer);
        self.io.write_all(&buffer, self.timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_twos_complement() {
        assert_eq!(checksum([0xfe, 0x00]), 0x02);
        assert_eq!(checksum([]), 0x00);
        assert_eq!(checksum([0x01]), 0xff);
        // Sum of 256 wraps to a zero checksum.
        assert_eq!(checksum([0x80, 0x80]), 0x00);
    }

    #[test]
    fn escape_doubles_every_dle() {
        assert_eq!(escape(&[0x10, 0x03]), vec![0x10, 0x10, 0x03]);
        assert_eq!(unescape(&[0x10, 0x10, 0x03]), vec![0x10, 0x03]);
        // Every DLE in an escaped body appears in an even-length run.
        let escaped = escape(&[0x10, 0x10, 0x10]);
        assert_eq!(escaped, vec![0x10; 6]);
        assert_eq!(unescape(&escaped), vec![0x10; 3]);
    }

    #[test]
    fn frame_roundtrip() {
        let data = vec![0x07, 0x00];
        let wire = frame(10, &data).unwrap();
        let packet = deframe(&wire).unwrap();
        assert_eq!(packet, Packet::new(10, data));
    }

    #[test]
    fn frame_stuffs_dle_in_payload() {
        // A payload of DLE ETX: the DLE is doubled, the ETX is left alone.
        let wire = frame(0x10, &[0x10, 0x03]).unwrap();
        assert_eq!(wire[0], DLE);
        assert_eq!(wire[1], 0x10); // id is not stuffed
        assert_eq!(wire[2], 0x02); // size
        assert_eq!(&wire[3..6], &[0x10, 0x10, 0x03]);
        assert_eq!(&wire[wire.len() - 2..], &[DLE, ETX]);
        assert_eq!(deframe(&wire).unwrap(), Packet::new(0x10, vec![0x10, 0x03]));
    }

    #[test]
    fn frame_with_size_0x10_is_stuffed() {
        let data = vec![0u8; 0x10];
        let wire = frame(35, &data).unwrap();
        // The size byte equals DLE and must be doubled.
        assert_eq!(&wire[2..4], &[0x10, 0x10]);
        assert_eq!(deframe(&wire).unwrap(), Packet::new(35, data));
    }

    #[test]
    fn maximum_data_length_roundtrips() {
        let data: Vec<u8> = (0..=254u8).chain([0xaa]).collect();
        assert_eq!(data.len(), 256);
        assert!(frame(35, &data).is_err());
        let data = &data[..255];
        let wire = frame(35, data).unwrap();
        assert_eq!(deframe(&wire).unwrap(), Packet::new(35, data.to_vec()));
    }

    #[test]
    fn pid_range_is_enforced() {
        assert!(matches!(frame(0, &[]), Err(ProtocolError::PidOutOfRange(0))));
        assert!(matches!(frame(875, &[]), Err(ProtocolError::PidOutOfRange(875))));
    }

    #[test]
    fn deframe_rejects_bad_checksum() {
        let mut wire = frame(10, &[0x07, 0x00]).unwrap();
        let n = wire.len();
        wire[n - 3] ^= 0x01;
        assert!(matches!(deframe(&wire), Err(LinkError::Checksum)));
    }

    #[test]
    fn deframe_rejects_bad_size() {
        // id 10, size says 3 but only 2 data bytes follow.
        let body = [10u8, 3, 1, 2];
        let cksum = checksum(body);
        let mut wire = vec![DLE];
        wire.extend_from_slice(&body);
        wire.push(cksum);
        wire.extend_from_slice(&[DLE, ETX]);
        assert!(matches!(deframe(&wire), Err(LinkError::Framing(_))));
    }

    #[tokio::test]
    async fn read_packet_acks_and_returns() {
        let (host, mut peer) = tokio::io::duplex(1024);
        let mut phys = SerialPhysical::sim(host);
        let wire = frame(255, &[0x0f, 0x00]).unwrap();
        peer.write_all(&wire).await.unwrap();
        let packet = phys.read_packet(true).await.unwrap();
        assert_eq!(packet.id, 255);
        // The peer should observe our ACK naming pid 255.
        let mut ack = vec![0u8; 9];
        peer.read_exact(&mut ack).await.unwrap();
        let ack = deframe(&ack).unwrap();
        assert_eq!(ack.id, PID_ACK);
        assert_eq!(ack.as_uint(), Some(255));
    }

    #[tokio::test]
    async fn send_packet_retries_on_nak_then_succeeds() {
        let (host, mut peer) = tokio::io::duplex(4096);
        let mut phys = SerialPhysical::sim(host);
        let nak = frame(PID_NAK, &[]).unwrap();
        let ack = frame(PID_ACK, &10u16.to_le_bytes()).unwrap();

        let peer_task = tokio::spawn(async move {
            let mut attempts = 0;
            let mut buf = vec![0u8; 4096];
            // First attempt gets a NAK, the retransmission gets an ACK.
            for reply in [&nak, &ack] {
                let n = peer.read(&mut buf).await.unwrap();
                assert!(n > 0);
                attempts += 1;
                peer.write_all(reply).await.unwrap();
            }
            attempts
        });

        phys.send_packet(10, Bytes::copy_from_slice(&[0x07, 0x00]), true)
            .await
            .unwrap();
        assert_eq!(peer_task.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn send_packet_exhausts_retry_budget() {
        let (host, mut peer) = tokio::io::duplex(4096);
        let mut phys = SerialPhysical::sim(host);
        let nak = frame(PID_NAK, &[]).unwrap();

        let peer_task = tokio::spawn(async move {
            let mut attempts = 0u32;
            let mut buf = vec![0u8; 4096];
            loop {
                match peer.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        attempts += 1;
                        if peer.write_all(&nak).await.is_err() {
                            break;
                        }
                    }
                }
            }
            attempts
        });

        let err = phys
            .send_packet(10, Bytes::copy_from_slice(&[0x07, 0x00]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GarminError::Link(LinkError::RetriesExceeded)));
        drop(phys);
        // max_retries + 1 attempts, no more.
        assert_eq!(peer_task.await.unwrap(), DEFAULT_MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn neither_ack_nor_nak_is_fatal() {
        let (host, mut peer) = tokio::io::duplex(4096);
        let mut phys = SerialPhysical::sim(host);
        let bogus = frame(99, &[]).unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let _ = peer.read(&mut buf).await;
            let _ = peer.write_all(&bogus).await;
            // Keep the peer open so the host side doesn't see EOF.
            let _ = peer.read(&mut buf).await;
        });
        let err = phys
            .send_packet(10, Bytes::copy_from_slice(&[0x07, 0x00]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GarminError::Session(_)));
    }
}
