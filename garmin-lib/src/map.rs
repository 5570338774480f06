//! A900 map memory transfer, A902 map unlock, and T001 baud negotiation.
//!
//! On devices without mass storage, maps live in numbered flash regions;
//! region 10 holds the supplementary user map and is the only region this
//! protocol is known to reach. The write commands borrow serial-flash
//! terminology: WREN sets the write-enable latch (confirmed by WEL) before
//! any write, WRDI clears it afterwards.

use crate::command::Command;
use crate::datatype::{
    BAUD_LIST, MAP_PRODUCT, MAP_SEGMENT, MAP_SET, MAP_UNKNOWN, MAP_UNLOCK, MEM_CHUNK, MEM_DATA,
    MEM_FILE, MEM_PROPERTIES, MEM_RECORD, MPS_FILE,
};
use crate::error::{GarminError, ProtocolError};
use crate::link::Pid;
use crate::schema::{Record, Value};
use crate::transfer::{Progress, Transfer};
use bytes::Bytes;
use tracing::{debug, info, warn};

/// Maximum payload of one `pid_mem_write` packet. The serial frame would
/// allow 251 bytes of chunk after the 4-byte offset, but transfers with
/// chunks above 250 bytes silently corrupt the uploaded map.
pub const MAP_WRITE_CHUNK: usize = 250;

/// The flash region holding the supplementary user map (gmapsupp.img).
pub const SUPPLEMENTARY_MAP_REGION: u16 = 10;

/// Relative baud error tolerance. UART 8N1 allows ±5% in total between the
/// two ends, so each side must stay within ±2.5%.
pub const BAUD_TOLERANCE: f64 = 0.025;

const NOMINAL_BAUDRATES: &[u32] = &[9600, 14400, 19200, 28800, 38400, 57600, 115200, 250000];

/// The MPS subfile names probed for map properties, in order.
const MPS_FILENAMES: &[&str] = &["MAKEGMAP.MPS", "MAPSOURC.MPS", "BLUCHART.MPS"];

/// Memory properties reported by the device.
#[derive(Debug, Clone, Copy)]
pub struct MemoryProperties {
    pub mem_region: u16,
    pub max_tiles: u16,
    pub mem_size: u32,
}

impl MemoryProperties {
    fn from_record(record: &Record) -> Option<MemoryProperties> {
        Some(MemoryProperties {
            mem_region: record.get("mem_region")?.as_u16()?,
            max_tiles: record.get("max_tiles")?.as_u16()?,
            mem_size: record.get("mem_size")?.as_u32()?,
        })
    }
}

/// One record of the MPS subfile describing the maps on the device.
#[derive(Debug, Clone)]
pub enum MpsEntry {
    Product(Record),
    Segment(Record),
    Unknown(Record),
    Unlock(Record),
    MapSet(Record),
}

/// Request the device's map memory properties.
pub async fn memory_properties(transfer: &mut Transfer<'_>) -> Result<MemoryProperties, GarminError> {
    info!("Request capacity data...");
    transfer.send_command(Command::TransferMem).await?;
    let packet = transfer.link.expect_packet(Pid::CapacityData).await?;
    let record = MEM_PROPERTIES.unpack(&packet.data)?;
    let properties = MemoryProperties::from_record(&record).ok_or(ProtocolError::Schema {
        schema: "MemProperties",
        message: "missing field".into(),
    })?;
    info!("Memory size: {} bytes", properties.mem_size);
    Ok(properties)
}

/// Read a region, or one subfile of it (empty name requests the whole
/// region). Returns `None` when the device reports the data as absent.
pub async fn read_memory(
    transfer: &mut Transfer<'_>,
    mem_region: u16,
    subfile: &str,
    mut progress: Progress<'_>,
) -> Result<Option<Vec<u8>>, GarminError> {
    info!("Get memory data...");
    let request = MEM_FILE.record(vec![
        Value::U32(0),
        Value::U16(mem_region),
        Value::Bytes(subfile.as_bytes().to_vec()),
    ])?;
    let data = MEM_FILE.pack(&request)?;
    transfer.link.send_packet(Pid::MemRead, data).await?;

    let packet = transfer.link.read_packet().await?;
    let mem_data = transfer.link.pid(Pid::MemData)?;
    let mem_records = transfer.link.pid(Pid::MemRecords)?;
    if packet.id == mem_data {
        let record = MEM_DATA.unpack(&packet.data)?;
        let payload = record.get("data").and_then(Value::as_bytes).unwrap_or(&[]);
        if payload.iter().all(|&b| b == 0) {
            info!("Data not found");
        } else {
            info!("Got unknown data {payload:02x?}. Ignoring...");
        }
        Ok(None)
    } else if packet.id == mem_records {
        let count = packet.as_uint().ok_or(ProtocolError::SizeMismatch)? as usize;
        info!("Expecting {count} records");
        let mut data = Vec::new();
        for index in 0..count {
            let packet = transfer.link.expect_packet(Pid::MemChunk).await?;
            let record = MEM_RECORD.unpack(&packet.data)?;
            if let Some(chunk) = record.get("chunk").and_then(Value::as_bytes) {
                data.extend_from_slice(chunk);
            }
            if let Some(callback) = progress.as_mut() {
                callback(index + 1, count);
            }
        }
        Ok(Some(data))
    } else {
        Err(ProtocolError::UnexpectedPidOneOf {
            expected: vec![mem_data, mem_records],
            got: packet.id,
        }
        .into())
    }
}

/// Write `data` into a region; `None` deletes the region's contents. The
/// sequence is: async events off, WREN, the chunk stream, WRDI.
pub async fn write_memory(
    transfer: &mut Transfer<'_>,
    mem_region: u16,
    data: Option<&[u8]>,
    mut progress: Progress<'_>,
) -> Result<(), GarminError> {
    info!("Turn off async mode");
    transfer
        .link
        .send_packet(Pid::EnableAsyncEvents, Bytes::from_static(&[0, 0]))
        .await?;
    info!("Enable write");
    transfer.link.send_u16(Pid::MemWren, mem_region).await?;
    transfer.link.expect_packet(Pid::MemWel).await?;
    info!("Write enabled");
    if let Some(data) = data {
        let total = data.len();
        for (index, chunk) in data.chunks(MAP_WRITE_CHUNK).enumerate() {
            let offset = index * MAP_WRITE_CHUNK;
            let record = MEM_CHUNK.record(vec![
                Value::U32(offset as u32),
                Value::Bytes(chunk.to_vec()),
            ])?;
            debug!("Upload {}/{} bytes", offset + chunk.len(), total);
            transfer
                .link
                .send_packet(Pid::MemWrite, MEM_CHUNK.pack(&record)?)
                .await?;
            if let Some(callback) = progress.as_mut() {
                callback(offset + chunk.len(), total);
            }
        }
    } else {
        info!("Delete map...");
    }
    info!("Disable write");
    transfer.link.send_u16(Pid::MemWrdi, mem_region).await
}

/// Probe the MPS subfile and decode the map descriptions it holds.
pub async fn map_properties(
    transfer: &mut Transfer<'_>,
    mem_region: u16,
) -> Result<Option<Vec<MpsEntry>>, GarminError> {
    info!("Get map properties...");
    for filename in MPS_FILENAMES {
        if let Some(data) = read_memory(transfer, mem_region, filename, None).await? {
            return Ok(Some(parse_mps(&data)?));
        }
    }
    Ok(None)
}

/// Decode the record stream of an MPS subfile.
pub fn parse_mps(data: &[u8]) -> Result<Vec<MpsEntry>, GarminError> {
    let file = MPS_FILE.unpack(data)?;
    let records = file
        .get("records")
        .and_then(Value::as_list)
        .unwrap_or(&[]);
    let mut entries = Vec::new();
    for record in records {
        let Some([Value::U8(kind), _, Value::Bytes(content)]) = record.as_tuple() else {
            continue;
        };
        let entry = match *kind {
            b'F' => MpsEntry::Product(MAP_PRODUCT.unpack(content)?),
            b'L' => MpsEntry::Segment(MAP_SEGMENT.unpack(content)?),
            b'P' => MpsEntry::Unknown(MAP_UNKNOWN.unpack(content)?),
            b'U' => MpsEntry::Unlock(MAP_UNLOCK.unpack(content)?),
            b'V' => MpsEntry::MapSet(MAP_SET.unpack(content)?),
            other => {
                warn!("Unknown MPS record type {other:#04x}. Ignoring...");
                continue;
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

/// Send the optional map unlock key and wait for the acknowledgement.
pub async fn send_unlock_key(transfer: &mut Transfer<'_>, key: &[u8]) -> Result<(), GarminError> {
    info!("Send unlock key");
    transfer
        .link
        .send_packet(Pid::TxUnlockKey, key.to_vec())
        .await?;
    info!("Acknowledge unlock key");
    transfer.link.expect_packet(Pid::AckUnlockKey).await?;
    Ok(())
}

/// Snap a reported baud rate to the nearest nominal value within the
/// tolerance, or `None` when it is out of range for every nominal rate.
pub fn desired_baudrate(baudrate: u32) -> Option<u32> {
    NOMINAL_BAUDRATES.iter().copied().find(|&nominal| {
        let relative = (f64::from(baudrate) - f64::from(nominal)).abs() / f64::from(nominal);
        relative <= BAUD_TOLERANCE
    })
}

/// Ask the device which baud rates it supports (T001).
pub async fn supported_baudrates(transfer: &mut Transfer<'_>) -> Result<Vec<u32>, GarminError> {
    info!("Get supported baudrates...");
    transfer.send_command(Command::TransferBaud).await?;
    let packet = transfer.link.expect_packet(Pid::BaudData).await?;
    let record = BAUD_LIST.unpack(&packet.data)?;
    let rates = record
        .get("baudrates")
        .and_then(Value::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(Value::as_u32)
        .filter_map(desired_baudrate)
        .collect();
    info!("Supported baudrates: {rates:?}");
    Ok(rates)
}

/// Change the link speed (T001).
///
/// The device answers a baud request with the highest acceptable rate
/// closest to the request. That rate is applied to the physical layer and
/// confirmed with two back-to-back ack pings; if the device does not see
/// them within two seconds, it falls back to 9600 on its own.
pub async fn set_baudrate(transfer: &mut Transfer<'_>, baudrate: u32) -> Result<u32, GarminError> {
    info!("Change baudrate to {baudrate}...");
    info!("Turn off async mode");
    transfer
        .link
        .send_packet(Pid::EnableAsyncEvents, Bytes::from_static(&[0, 0]))
        .await?;
    info!("Request baudrate change");
    transfer
        .link
        .send_packet(Pid::BaudRqstData, baudrate.to_le_bytes().to_vec())
        .await?;
    let packet = transfer.link.expect_packet(Pid::BaudAcptData).await?;
    let accepted = packet.as_uint().ok_or(ProtocolError::SizeMismatch)? as u32;
    info!("Accepted baudrate: {accepted}");
    let desired =
        desired_baudrate(accepted).ok_or(ProtocolError::UnsupportedBaudRate(accepted))?;
    info!("Set the baudrate to {desired}");
    transfer.link.physical_mut().set_baudrate(desired)?;
    // Confirm within the device's two-second window, twice.
    transfer.send_command(Command::AckPing).await?;
    transfer.send_command(Command::AckPing).await?;
    info!("Baudrate successfully changed to {desired}");
    Ok(desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandProtocol;
    use crate::link::{Link, LinkProtocol};
    use crate::packet::Packet;
    use crate::physical::{MockPhysical, PhysicalLayer};

    fn link_with(packets: Vec<Packet>) -> Link {
        let mut link = Link::new(PhysicalLayer::Mock(MockPhysical::new(packets)));
        link.protocol = LinkProtocol::L001;
        link
    }

    fn sent(link: &Link) -> &[Packet] {
        match link.physical() {
            PhysicalLayer::Mock(mock) => &mock.sent,
            _ => unreachable!(),
        }
    }

    #[test]
    fn baud_tolerance_window() {
        assert_eq!(desired_baudrate(9600), Some(9600));
        // 2.4% below 115200 still snaps to the nominal rate.
        assert_eq!(desired_baudrate(112500), Some(115200));
        // 57600 reported as 57.6k + 5% does not.
        assert_eq!(desired_baudrate(60500), None);
        assert_eq!(desired_baudrate(123), None);
    }

    #[tokio::test]
    async fn memory_read_assembles_chunks_in_order() {
        let mut link = link_with(vec![
            Packet::with_u16(91, 2),
            Packet::new(90, {
                let mut v = vec![0u8];
                v.extend_from_slice(b"abc");
                v
            }),
            Packet::new(90, {
                let mut v = vec![1u8];
                v.extend_from_slice(b"def");
                v
            }),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let data = read_memory(&mut transfer, 10, "", None).await.unwrap();
        assert_eq!(data.as_deref(), Some(&b"abcdef"[..]));
        // The request carried region 10 and an empty subfile name.
        let request = &sent(&link)[0];
        assert_eq!(request.id, 89);
        assert_eq!(&request.data[..], &[0, 0, 0, 0, 10, 0, 0]);
    }

    #[tokio::test]
    async fn memory_read_not_found_is_none() {
        let mut link = link_with(vec![Packet::new(92, vec![4u8, 0, 0, 0, 0])]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let data = read_memory(&mut transfer, 10, "MAKEGMAP.MPS", None).await.unwrap();
        assert_eq!(data, None);
    }

    #[tokio::test]
    async fn write_memory_runs_wren_chunks_wrdi() {
        let mut link = link_with(vec![Packet::empty(74)]); // WEL
        let data = vec![0xaau8; 600];
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        write_memory(&mut transfer, 10, Some(&data), None).await.unwrap();
        let sent = sent(&link);
        // async off, WREN, three chunks (250 + 250 + 100), WRDI
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[0].id, 28);
        assert_eq!(sent[1], Packet::with_u16(75, 10));
        assert_eq!(sent[2].id, 36);
        assert_eq!(sent[2].data.len(), 4 + 250);
        assert_eq!(&sent[3].data[..4], &250u32.to_le_bytes());
        assert_eq!(sent[4].data.len(), 4 + 100);
        assert_eq!(sent[5], Packet::with_u16(45, 10));
    }

    #[tokio::test]
    async fn baud_negotiation_applies_accepted_rate() {
        let mut link = link_with(vec![Packet::new(49, 115000u32.to_le_bytes().to_vec())]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let applied = set_baudrate(&mut transfer, 115200).await.unwrap();
        assert_eq!(applied, 115200);
        assert_eq!(link.physical().baudrate(), Some(115200));
        let sent = sent(&link);
        // async off, baud request, then the two confirmation pings
        assert_eq!(sent[1].id, 48);
        assert_eq!(sent[2], Packet::with_u16(10, 58));
        assert_eq!(sent[3], Packet::with_u16(10, 58));
    }

    #[test]
    fn mps_stream_decodes_typed_records() {
        // One product record ('F') and one map set record ('V').
        let mut product = Vec::new();
        product.extend_from_slice(&1u16.to_le_bytes());
        product.extend_from_slice(&2u16.to_le_bytes());
        product.extend_from_slice(b"Test Map\0");
        let mut mapset = Vec::new();
        mapset.extend_from_slice(b"My Set\0");
        mapset.push(1);
        let mut data = Vec::new();
        data.push(b'F');
        data.extend_from_slice(&(product.len() as u16).to_le_bytes());
        data.extend_from_slice(&product);
        data.push(b'V');
        data.extend_from_slice(&(mapset.len() as u16).to_le_bytes());
        data.extend_from_slice(&mapset);
        let entries = parse_mps(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], MpsEntry::Product(_)));
        assert!(matches!(entries[1], MpsEntry::MapSet(_)));
    }
}
