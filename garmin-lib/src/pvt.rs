//! A800 PVT streaming.
//!
//! In PVT mode the device transmits a packet roughly once per second with
//! real-time position, velocity, and time. The mode is switched with the
//! start/stop commands; stopping is cooperative, the caller keeps reading
//! until the stream drains (a read then times out).
//!
//! Devices that only declare D800 still interleave an undocumented
//! satellite status packet with the PVT packets, so the schema is selected
//! by the received pid rather than by the declaration.

use crate::datatype::SATELLITE;
use crate::error::{GarminError, ProtocolError};
use crate::link::Pid;
use crate::schema::{Record, Schema};
use crate::transfer::Transfer;
use crate::command::Command;
use tracing::debug;

pub struct PvtStream<'a> {
    transfer: Transfer<'a>,
    datatype: &'static Schema,
}

impl<'a> PvtStream<'a> {
    /// Wrap a transfer driver with the negotiated PVT datatype (`D0`).
    pub fn new(transfer: Transfer<'a>, datatype: &'static Schema) -> Self {
        PvtStream { transfer, datatype }
    }

    /// Ask the device to start transmitting PVT data.
    pub async fn data_on(&mut self) -> Result<(), GarminError> {
        self.transfer.send_command(Command::StartPvtData).await
    }

    /// Ask the device to stop transmitting PVT data.
    pub async fn data_off(&mut self) -> Result<(), GarminError> {
        self.transfer.send_command(Command::StopPvtData).await
    }

    /// Block until the next PVT or satellite packet arrives and decode it
    /// by pid.
    pub async fn next(&mut self) -> Result<Record, GarminError> {
        let pvt_pid = self.transfer.link.pid(Pid::PvtData)?;
        let satellite_pid = self.transfer.link.pid(Pid::SatelliteData)?;
        let packet = self.transfer.link.read_packet().await?;
        let schema: &'static Schema = if packet.id == pvt_pid {
            self.datatype
        } else if packet.id == satellite_pid {
            &SATELLITE
        } else {
            return Err(ProtocolError::UnexpectedPidOneOf {
                expected: vec![pvt_pid, satellite_pid],
                got: packet.id,
            }
            .into());
        };
        debug!("PVT packet decoded as {}", schema.name);
        Ok(schema.unpack(&packet.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandProtocol;
    use crate::datatype::D800;
    use crate::error::LinkError;
    use crate::link::{Link, LinkProtocol};
    use crate::packet::Packet;
    use crate::physical::{MockPhysical, PhysicalLayer};

    fn d800_bytes() -> Vec<u8> {
        vec![0u8; 64]
    }

    fn satellite_bytes() -> Vec<u8> {
        vec![0u8; 84]
    }

    #[tokio::test]
    async fn stream_alternates_pvt_and_satellite() {
        let mut link = Link::new(PhysicalLayer::Mock(MockPhysical::new(vec![
            Packet::new(51, d800_bytes()),
            Packet::new(114, satellite_bytes()),
            Packet::new(51, d800_bytes()),
            Packet::new(114, satellite_bytes()),
        ])));
        link.protocol = LinkProtocol::L001;
        let transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let mut stream = PvtStream::new(transfer, &D800);
        stream.data_on().await.unwrap();

        let names: Vec<&str> = [
            stream.next().await.unwrap(),
            stream.next().await.unwrap(),
            stream.next().await.unwrap(),
            stream.next().await.unwrap(),
        ]
        .iter()
        .map(|r| r.schema_name())
        .collect::<Vec<_>>();
        assert_eq!(names, ["D800", "Satellite", "D800", "Satellite"]);

        // After data_off the stream drains; the next read times out.
        stream.data_off().await.unwrap();
        let err = stream.next().await.unwrap_err();
        assert!(matches!(err, GarminError::Link(LinkError::Timeout)));
    }

    #[tokio::test]
    async fn unknown_pid_in_stream_is_an_error() {
        let mut link = Link::new(PhysicalLayer::Mock(MockPhysical::new(vec![Packet::empty(35)])));
        link.protocol = LinkProtocol::L001;
        let transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let mut stream = PvtStream::new(transfer, &D800);
        let err = stream.next().await.unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnexpectedPidOneOf { got: 35, .. })
        ));
    }
}
