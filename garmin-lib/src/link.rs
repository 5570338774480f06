//! Link layer.
//!
//! All devices implement the L000 Basic Link Protocol, which is enough to
//! run product-data negotiation. Most devices then upgrade to L001; some
//! panel-mounted aviation devices use L002 instead. The link protocols
//! differ only in their packet id assignments, so they are modeled as a
//! symbolic [`Pid`] name resolved through the negotiated [`LinkProtocol`].
//!
//! The layer itself adds exactly one behavior over the physical layer:
//! `pid_ext_product_data` packets (manufacturing strings the host must
//! ignore) are discarded transparently while reading.

use crate::error::{GarminError, ProtocolError};
use crate::packet::Packet;
use crate::physical::PhysicalLayer;
use bytes::Bytes;
use tracing::debug;

/// Symbolic packet id, resolved against the active link protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pid {
    // L000 basic link protocol
    ExtProductData,
    ProtocolArray,
    ProductRqst,
    ProductData,
    // product-specific link protocols
    CommandData,
    XferCmplt,
    DateTimeData,
    PositionData,
    PrxWptData,
    Records,
    EnableAsyncEvents,
    RteHdr,
    RteWptData,
    AlmanacData,
    TrkData,
    WptData,
    MemWrite,
    UnitId,
    MemWrdi,
    BaudRqstData,
    BaudAcptData,
    PvtData,
    ScreenData,
    MemWel,
    MemWren,
    MemRead,
    MemChunk,
    MemRecords,
    MemData,
    CapacityData,
    RteLinkData,
    TrkHdr,
    TxUnlockKey,
    AckUnlockKey,
    SatelliteData,
    FlightbookRecord,
    Lap,
    WptCat,
    BaudData,
    ImageNameRx,
    ImageNameTx,
    ImageListRx,
    ImageListTx,
    ImagePropsRx,
    ImagePropsTx,
    ImageIdRx,
    ImageIdTx,
    ImageDataCmplt,
    ImageDataRx,
    ImageDataTx,
    ColorTableRx,
    ColorTableTx,
    ImageTypeIdxRx,
    ImageTypeIdxTx,
    ImageTypeNameRx,
    ImageTypeNameTx,
    Run,
    Workout,
    WorkoutOccurrence,
    FitnessUserProfile,
    WorkoutLimits,
    Course,
    CourseLap,
    CoursePoint,
    CourseTrkHdr,
    CourseTrkData,
    CourseLimits,
    ExternalTimeSyncData,
}

/// The negotiated link protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkProtocol {
    L000,
    L001,
    L002,
}

impl LinkProtocol {
    /// Resolve a symbolic pid to its numeric id, or `None` when the active
    /// link protocol does not define it.
    pub fn pid(self, pid: Pid) -> Option<u16> {
        // The basic link protocol ids are shared by every device.
        match pid {
            Pid::ExtProductData => return Some(248),
            Pid::ProtocolArray => return Some(253),
            Pid::ProductRqst => return Some(254),
            Pid::ProductData => return Some(255),
            _ => {}
        }
        match self {
            LinkProtocol::L000 => None,
            LinkProtocol::L001 => l001_pid(pid),
            LinkProtocol::L002 => l002_pid(pid),
        }
    }
}

/// Link Protocol 1, used by most devices.
fn l001_pid(pid: Pid) -> Option<u16> {
    use Pid::*;
    let id = match pid {
        CommandData => 10,
        XferCmplt => 12,
        DateTimeData => 14,
        PositionData => 17,
        PrxWptData => 19,
        Records => 27,
        EnableAsyncEvents => 28,
        RteHdr => 29,
        RteWptData => 30,
        AlmanacData => 31,
        TrkData => 34,
        WptData => 35,
        MemWrite => 36,  // undocumented
        UnitId => 38,    // undocumented
        MemWrdi => 45,   // write disable (WRDI), undocumented
        BaudRqstData => 48, // undocumented
        BaudAcptData => 49, // undocumented
        PvtData => 51,
        ScreenData => 69, // undocumented
        MemWel => 74,     // write enable latch (WEL), undocumented
        MemWren => 75,    // write enable (WREN), undocumented
        MemRead => 89,    // undocumented
        MemChunk => 90,   // undocumented
        MemRecords => 91, // undocumented
        MemData => 92,    // undocumented
        CapacityData => 95, // undocumented
        RteLinkData => 98,
        TrkHdr => 99,
        TxUnlockKey => 108,  // undocumented
        AckUnlockKey => 109, // undocumented
        SatelliteData => 114,
        FlightbookRecord => 134,
        Lap => 149,
        WptCat => 152,
        BaudData => 252, // undocumented
        ImageNameRx => 875,
        ImageNameTx => 876,
        ImageListRx => 877,
        ImageListTx => 878,
        ImagePropsRx => 879,
        ImagePropsTx => 880,
        ImageIdRx => 881,
        ImageIdTx => 882,
        ImageDataCmplt => 883,
        ImageDataRx => 884,
        ImageDataTx => 885,
        ColorTableRx => 886,
        ColorTableTx => 887,
        ImageTypeIdxRx => 888,
        ImageTypeIdxTx => 889,
        ImageTypeNameRx => 890,
        ImageTypeNameTx => 891,
        Run => 990,
        Workout => 991,
        WorkoutOccurrence => 992,
        FitnessUserProfile => 993,
        WorkoutLimits => 994,
        Course => 1061,
        CourseLap => 1062,
        CoursePoint => 1063,
        CourseTrkHdr => 1064,
        CourseTrkData => 1065,
        CourseLimits => 1066,
        ExternalTimeSyncData => 6724,
        _ => return None,
    };
    Some(id)
}

/// Link Protocol 2, used by panel-mounted aviation devices.
fn l002_pid(pid: Pid) -> Option<u16> {
    use Pid::*;
    let id = match pid {
        AlmanacData => 4,
        CommandData => 11,
        XferCmplt => 12,
        DateTimeData => 20,
        PositionData => 24,
        PrxWptData => 27,
        Records => 35,
        RteHdr => 37,
        RteWptData => 39,
        WptData => 43,
        _ => return None,
    };
    Some(id)
}

/// The link layer: a physical transport plus the negotiated id table.
pub struct Link {
    phys: PhysicalLayer,
    pub protocol: LinkProtocol,
}

impl Link {
    /// Wrap a physical layer. Sessions start on [`LinkProtocol::L000`] and
    /// upgrade once the capability set is known.
    pub fn new(phys: PhysicalLayer) -> Self {
        Link { phys, protocol: LinkProtocol::L000 }
    }

    pub fn physical(&self) -> &PhysicalLayer {
        &self.phys
    }

    pub fn physical_mut(&mut self) -> &mut PhysicalLayer {
        &mut self.phys
    }

    /// Resolve a symbolic pid, failing when the link protocol in use does
    /// not define it.
    pub fn pid(&self, pid: Pid) -> Result<u16, ProtocolError> {
        self.protocol
            .pid(pid)
            .ok_or(ProtocolError::UnsupportedPid(pid))
    }

    /// Read the next packet, discarding extended product data.
    pub async fn read_packet(&mut self) -> Result<Packet, GarminError> {
        let ext_product_data = self.protocol.pid(Pid::ExtProductData);
        loop {
            let packet = self.phys.read_packet().await?;
            if Some(packet.id) == ext_product_data {
                debug!("Got extended product data. Ignoring...");
                continue;
            }
            return Ok(packet);
        }
    }

    /// Read the next packet and fail unless it carries the expected id.
    pub async fn expect_packet(&mut self, pid: Pid) -> Result<Packet, GarminError> {
        let expected = self.pid(pid)?;
        let packet = self.read_packet().await?;
        if packet.id != expected {
            return Err(ProtocolError::UnexpectedPid { expected, got: packet.id }.into());
        }
        Ok(packet)
    }

    pub async fn send_packet(&mut self, pid: Pid, data: impl Into<Bytes>) -> Result<(), GarminError> {
        let id = self.pid(pid)?;
        self.phys.send_packet(id, data.into()).await
    }

    /// Send a packet whose payload is a 16-bit little-endian value.
    pub async fn send_u16(&mut self, pid: Pid, value: u16) -> Result<(), GarminError> {
        let id = self.pid(pid)?;
        self.phys
            .send_packet(id, Bytes::copy_from_slice(&value.to_le_bytes()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::MockPhysical;

    #[test]
    fn basic_link_ids_are_shared() {
        for protocol in [LinkProtocol::L000, LinkProtocol::L001, LinkProtocol::L002] {
            assert_eq!(protocol.pid(Pid::ProductRqst), Some(254));
            assert_eq!(protocol.pid(Pid::ProductData), Some(255));
            assert_eq!(protocol.pid(Pid::ExtProductData), Some(248));
            assert_eq!(protocol.pid(Pid::ProtocolArray), Some(253));
        }
    }

    #[test]
    fn link_protocols_disagree_on_transfer_ids() {
        assert_eq!(LinkProtocol::L001.pid(Pid::Records), Some(27));
        assert_eq!(LinkProtocol::L002.pid(Pid::Records), Some(35));
        assert_eq!(LinkProtocol::L001.pid(Pid::PvtData), Some(51));
        assert_eq!(LinkProtocol::L002.pid(Pid::PvtData), None);
        assert_eq!(LinkProtocol::L000.pid(Pid::Records), None);
    }

    #[tokio::test]
    async fn ext_product_data_is_filtered() {
        let mock = MockPhysical::new([
            Packet::new(248, b"gibberish\0".to_vec()),
            Packet::new(248, b"more\0".to_vec()),
            Packet::with_u16(255, 62),
        ]);
        let mut link = Link::new(PhysicalLayer::Mock(mock));
        let packet = link.read_packet().await.unwrap();
        assert_eq!(packet.id, 255);
    }

    #[tokio::test]
    async fn expect_packet_rejects_wrong_pid() {
        let mock = MockPhysical::new([Packet::empty(27)]);
        let mut link = Link::new(PhysicalLayer::Mock(mock));
        link.protocol = LinkProtocol::L001;
        let err = link.expect_packet(Pid::WptData).await.unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnexpectedPid { expected: 35, got: 27 })
        ));
    }
}
