//! Bulk transfer protocols.
//!
//! Most application protocols share one envelope: the host sends a command,
//! the device answers with `pid_records` carrying the number of data
//! packets to follow, then exactly that many data packets, then
//! `pid_xfer_cmplt` echoing the command. Uploads mirror the sequence.
//!
//! When a protocol permits several data pids (route header, route waypoint,
//! route link), the schema applied to a packet is the one at the position
//! of its pid in the protocol's declared pid list.

use crate::command::{Command, CommandProtocol};
use crate::datatype::RECORDS;
use crate::error::{GarminError, ProtocolError};
use crate::link::{Link, Pid};
use crate::schema::{Record, Schema, Value};
use tracing::{debug, info};

/// Progress callback: invoked once per data packet with
/// `(current_record, total_records)`.
pub type Progress<'a> = Option<&'a mut dyn FnMut(usize, usize)>;

/// Reborrow a progress callback for a shorter lifetime than the one it was
/// originally passed with, so it can be handed to several sequential calls.
pub fn reborrow_progress<'a>(progress: &'a mut Progress<'_>) -> Progress<'a> {
    match progress {
        Some(callback) => Some(&mut **callback),
        None => None,
    }
}

/// The command and data pids (in schema order) of a bulk transfer
/// protocol.
pub fn bulk_binding(kind: u8, number: u16) -> Option<(Command, &'static [Pid])> {
    let binding: (Command, &'static [Pid]) = match (kind, number) {
        (b'A', 100) => (Command::TransferWpt, &[Pid::WptData]),
        (b'A', 101) => (Command::TransferWptCats, &[Pid::WptCat]),
        (b'A', 200) => (Command::TransferRte, &[Pid::RteHdr, Pid::RteWptData]),
        (b'A', 201) => (
            Command::TransferRte,
            &[Pid::RteHdr, Pid::RteWptData, Pid::RteLinkData],
        ),
        (b'A', 300) => (Command::TransferTrk, &[Pid::TrkData]),
        (b'A', 301) | (b'A', 302) => (Command::TransferTrk, &[Pid::TrkHdr, Pid::TrkData]),
        (b'A', 400) => (Command::TransferPrx, &[Pid::PrxWptData]),
        (b'A', 500) => (Command::TransferAlm, &[Pid::AlmanacData]),
        (b'A', 650) => (Command::FlightbookTransfer, &[Pid::FlightbookRecord]),
        (b'A', 906) => (Command::TransferLaps, &[Pid::Lap]),
        (b'A', 1000) => (Command::TransferRuns, &[Pid::Run]),
        (b'A', 1002) => (Command::TransferWorkouts, &[Pid::Workout]),
        (b'A', 1003) => (
            Command::TransferWorkoutOccurrences,
            &[Pid::WorkoutOccurrence],
        ),
        (b'A', 1006) => (Command::TransferCourses, &[Pid::Course]),
        (b'A', 1007) => (Command::TransferCourseLaps, &[Pid::CourseLap]),
        (b'A', 1008) => (Command::TransferCoursePoints, &[Pid::CoursePoint]),
        (b'A', 1012) => (
            Command::TransferCourseTracks,
            &[Pid::CourseTrkHdr, Pid::CourseTrkData],
        ),
        _ => return None,
    };
    Some(binding)
}

/// The command and reply pid of a single-record protocol (no
/// records/xfer_cmplt envelope).
pub fn single_binding(kind: u8, number: u16) -> Option<(Command, Pid)> {
    let binding = match (kind, number) {
        (b'A', 600) => (Command::TransferTime, Pid::DateTimeData),
        (b'A', 700) => (Command::TransferPosn, Pid::PositionData),
        (b'A', 1004) => (Command::TransferFitnessUserProfile, Pid::FitnessUserProfile),
        (b'A', 1005) => (Command::TransferWorkoutLimits, Pid::WorkoutLimits),
        (b'A', 1009) => (Command::TransferCourseLimits, Pid::CourseLimits),
        _ => return None,
    };
    Some(binding)
}

/// Transfer driver over a link and the negotiated command protocol.
pub struct Transfer<'a> {
    pub link: &'a mut Link,
    pub commands: CommandProtocol,
}

impl Transfer<'_> {
    pub fn new(link: &mut Link, commands: CommandProtocol) -> Transfer<'_> {
        Transfer { link, commands }
    }

    fn command_code(&self, command: Command) -> Result<u16, ProtocolError> {
        self.commands
            .code(command)
            .ok_or(ProtocolError::UnsupportedCommand(command))
    }

    /// Send a `pid_command_data` packet carrying the command code.
    pub async fn send_command(&mut self, command: Command) -> Result<(), GarminError> {
        let code = self.command_code(command)?;
        self.link.send_u16(Pid::CommandData, code).await
    }

    /// Run one download: command, records count, count data packets, and
    /// the transfer-complete marker. Data packets are decoded with the
    /// datatype at their pid's position and delivered in emission order.
    pub async fn download(
        &mut self,
        command: Command,
        pids: &[Pid],
        datatypes: &[&'static Schema],
        mut progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        self.send_command(command).await?;
        let packet = self.link.expect_packet(Pid::Records).await?;
        let count = RECORDS
            .unpack(&packet.data)?
            .get("records")
            .and_then(Value::as_u16)
            .unwrap_or(0) as usize;
        info!("Expecting {count} records");

        let permitted: Vec<u16> = pids
            .iter()
            .map(|&pid| self.link.pid(pid))
            .collect::<Result<_, _>>()?;

        let mut result = Vec::with_capacity(count);
        for index in 0..count {
            let packet = self.link.read_packet().await?;
            let position = permitted
                .iter()
                .position(|&pid| pid == packet.id)
                .ok_or_else(|| ProtocolError::UnexpectedPidOneOf {
                    expected: permitted.clone(),
                    got: packet.id,
                })?;
            let schema = datatypes.get(position).ok_or(ProtocolError::Schema {
                schema: "transfer",
                message: format!("no datatype at position {position}"),
            })?;
            let record = schema.unpack(&packet.data)?;
            debug!("Record {}/{count}: {}", index + 1, record.schema_name());
            if let Some(callback) = progress.as_mut() {
                callback(index + 1, count);
            }
            result.push(record);
        }
        // A surplus data packet surfaces here as an unexpected pid; a
        // missing one surfaced above when xfer_cmplt arrived early.
        self.link.expect_packet(Pid::XferCmplt).await?;
        Ok(result)
    }

    /// Run one upload: records count, the data packets, and the
    /// transfer-complete marker echoing the command.
    pub async fn upload(
        &mut self,
        command: Command,
        packets: &[(Pid, Record)],
        mut progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        let code = self.command_code(command)?;
        let count = u16::try_from(packets.len()).map_err(|_| {
            ProtocolError::Invalid(format!("cannot send {} records in one transfer", packets.len()))
        })?;
        info!("Sending {count} records");
        self.link.send_u16(Pid::Records, count).await?;
        for (index, (pid, record)) in packets.iter().enumerate() {
            let data = record.schema().pack(record)?;
            self.link.send_packet(*pid, data).await?;
            if let Some(callback) = progress.as_mut() {
                callback(index + 1, packets.len());
            }
        }
        self.link.send_u16(Pid::XferCmplt, code).await
    }

    /// Run a single-record exchange: the command, then exactly one packet
    /// of the given pid.
    pub async fn single(
        &mut self,
        command: Command,
        pid: Pid,
        schema: &'static Schema,
    ) -> Result<Record, GarminError> {
        self.send_command(command).await?;
        let packet = self.link.expect_packet(pid).await?;
        Ok(schema.unpack(&packet.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{D100, D201, D210};
    use crate::link::LinkProtocol;
    use crate::packet::Packet;
    use crate::physical::{MockPhysical, PhysicalLayer};
    use crate::schema::Value;

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

    fn d100_bytes(ident: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut id = ident.to_vec();
        id.resize(6, 0);
        data.extend_from_slice(&id);
        data.extend_from_slice(&[0u8; 8]); // posn
        data.extend_from_slice(&[0u8; 4]); // unused
        data.extend_from_slice(&[0u8; 40]); // cmnt
        data
    }

    #[tokio::test]
    async fn waypoint_download_decodes_n_records() {
        // Device script: records count of two, two D100 waypoints, then
        // transfer complete echoing the command.
        let mut link = link_with(vec![
            Packet::with_u16(27, 2),
            Packet::new(35, d100_bytes(b"ALPHA")),
            Packet::new(35, d100_bytes(b"BRAVO")),
            Packet::with_u16(12, 7),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let records = transfer
            .download(Command::TransferWpt, &[Pid::WptData], &[&D100], None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("ident").unwrap().as_bytes(),
            Some(&b"ALPHA\0"[..])
        );
        // The host sent the transfer-waypoints command, 07 00.
        let sent = sent(&link);
        assert_eq!(sent[0], Packet::with_u16(10, 7));
    }

    #[tokio::test]
    async fn progress_is_reported_per_packet() {
        let mut link = link_with(vec![
            Packet::with_u16(27, 2),
            Packet::new(35, d100_bytes(b"A")),
            Packet::new(35, d100_bytes(b"B")),
            Packet::with_u16(12, 7),
        ]);
        let mut seen = Vec::new();
        let mut callback = |current: usize, total: usize| seen.push((current, total));
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        transfer
            .download(Command::TransferWpt, &[Pid::WptData], &[&D100], Some(&mut callback))
            .await
            .unwrap();
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn early_transfer_complete_is_an_error() {
        // Count says two but the device sends the end marker after one.
        let mut link = link_with(vec![
            Packet::with_u16(27, 2),
            Packet::new(35, d100_bytes(b"A")),
            Packet::with_u16(12, 7),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let err = transfer
            .download(Command::TransferWpt, &[Pid::WptData], &[&D100], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnexpectedPidOneOf { got: 12, .. })
        ));
    }

    #[tokio::test]
    async fn surplus_data_packet_is_an_error() {
        let mut link = link_with(vec![
            Packet::with_u16(27, 1),
            Packet::new(35, d100_bytes(b"A")),
            Packet::new(35, d100_bytes(b"B")),
            Packet::with_u16(12, 7),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let err = transfer
            .download(Command::TransferWpt, &[Pid::WptData], &[&D100], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnexpectedPid { expected: 12, got: 35 })
        ));
    }

    #[tokio::test]
    async fn multi_pid_download_uses_positional_schemas() {
        let mut header = vec![1u8];
        header.extend_from_slice(&[0u8; 20]);
        let mut link = link_with(vec![
            Packet::with_u16(27, 2),
            Packet::new(29, header),
            Packet::new(35, d100_bytes(b"WPT1")),
            Packet::with_u16(12, 4),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let records = transfer
            .download(
                Command::TransferRte,
                &[Pid::RteHdr, Pid::RteWptData],
                &[&D201, &D100],
                None,
            )
            .await
            .unwrap();
        assert_eq!(records[0].schema_name(), "D201");
        assert_eq!(records[1].schema_name(), "D100");
    }

    #[tokio::test]
    async fn route_upload_sends_envelope_in_order() {
        // A201 route with a header, two waypoints, and one link between
        // them: four records framed by pid_records and pid_xfer_cmplt.
        let mut link = link_with(vec![]);
        let header = D201
            .record(vec![
                Value::U8(1),
                Value::Bytes(vec![0; 20]),
            ])
            .unwrap();
        let wpt = |ident: &[u8]| D100.unpack(&d100_bytes(ident)).unwrap();
        let rte_link = D210
            .record(vec![
                Value::U16(0),
                Value::Bytes(vec![0; 18]),
                Value::Bytes(Vec::new()),
            ])
            .unwrap();
        let packets = vec![
            (Pid::RteHdr, header),
            (Pid::RteWptData, wpt(b"ONE")),
            (Pid::RteLinkData, rte_link),
            (Pid::RteWptData, wpt(b"TWO")),
        ];
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        transfer
            .upload(Command::TransferRte, &packets, None)
            .await
            .unwrap();
        let sent = sent(&link);
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[0], Packet::with_u16(27, 4)); // records
        assert_eq!(sent[1].id, 29);
        assert_eq!(sent[2].id, 30);
        assert_eq!(sent[3].id, 98);
        assert_eq!(sent[4].id, 30);
        assert_eq!(sent[5], Packet::with_u16(12, 4)); // xfer_cmplt(xfer_rte)
    }

    #[tokio::test]
    async fn a011_rejects_fitness_commands() {
        let mut link = link_with(vec![]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A011);
        let err = transfer.send_command(Command::TransferRuns).await.unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnsupportedCommand(Command::TransferRuns))
        ));
    }

    #[test]
    fn bindings_cover_the_documented_protocols() {
        assert!(bulk_binding(b'A', 100).is_some());
        assert!(bulk_binding(b'A', 201).is_some());
        assert!(bulk_binding(b'A', 302).is_some());
        assert!(bulk_binding(b'A', 1012).is_some());
        assert!(bulk_binding(b'A', 800).is_none());
        assert!(single_binding(b'A', 600).is_some());
        assert!(single_binding(b'A', 700).is_some());
        assert!(single_binding(b'A', 100).is_none());
    }
}
