//! Protocol registry.
//!
//! The registry binds each protocol role (waypoint transfer, PVT, map
//! transfer, ...) to the concrete protocol the device negotiated and the
//! datatype schemas in positional order. It is built once per session from
//! the A001 capability array or the fallback table; roles the device did
//! not report are simply absent, and invoking them fails with a
//! protocol-not-supported error.

use crate::capability::{Capability, ProtocolId};
use crate::command::CommandProtocol;
use crate::datatype::datatype_schema;
use crate::error::ProtocolError;
use crate::link::LinkProtocol;
use crate::schema::Schema;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The roles a negotiated protocol can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolRole {
    Link,
    DeviceCommand,
    Transmission,
    WaypointTransfer,
    WaypointCategoryTransfer,
    RouteTransfer,
    TrackLogTransfer,
    ProximityWaypointTransfer,
    AlmanacTransfer,
    DateAndTimeInitialization,
    FlightbookTransfer,
    PositionInitialization,
    Pvt,
    MapTransfer,
    MapUnlock,
    LapTransfer,
    RunTransfer,
    WorkoutTransfer,
    WorkoutOccurrenceTransfer,
    FitnessUserProfileTransfer,
    WorkoutLimitsTransfer,
    CourseTransfer,
    CourseLapTransfer,
    CoursePointTransfer,
    CourseLimitsTransfer,
    CourseTrackTransfer,
    ExternalTimeSync,
}

impl ProtocolRole {
    pub fn name(self) -> &'static str {
        match self {
            ProtocolRole::Link => "link_protocol",
            ProtocolRole::DeviceCommand => "device_command_protocol",
            ProtocolRole::Transmission => "transmission_protocol",
            ProtocolRole::WaypointTransfer => "waypoint_transfer_protocol",
            ProtocolRole::WaypointCategoryTransfer => "waypoint_category_transfer_protocol",
            ProtocolRole::RouteTransfer => "route_transfer_protocol",
            ProtocolRole::TrackLogTransfer => "track_log_transfer_protocol",
            ProtocolRole::ProximityWaypointTransfer => "proximity_waypoint_transfer_protocol",
            ProtocolRole::AlmanacTransfer => "almanac_transfer_protocol",
            ProtocolRole::DateAndTimeInitialization => "date_and_time_initialization_protocol",
            ProtocolRole::FlightbookTransfer => "flightbook_transfer_protocol",
            ProtocolRole::PositionInitialization => "position_initialization_protocol",
            ProtocolRole::Pvt => "pvt_protocol",
            ProtocolRole::MapTransfer => "map_transfer_protocol",
            ProtocolRole::MapUnlock => "map_unlock_protocol",
            ProtocolRole::LapTransfer => "lap_transfer_protocol",
            ProtocolRole::RunTransfer => "run_transfer_protocol",
            ProtocolRole::WorkoutTransfer => "workout_transfer_protocol",
            ProtocolRole::WorkoutOccurrenceTransfer => "workout_occurrence_transfer_protocol",
            ProtocolRole::FitnessUserProfileTransfer => "fitness_user_profile_transfer_protocol",
            ProtocolRole::WorkoutLimitsTransfer => "workout_limits_transfer_protocol",
            ProtocolRole::CourseTransfer => "course_transfer_protocol",
            ProtocolRole::CourseLapTransfer => "course_lap_transfer_protocol",
            ProtocolRole::CoursePointTransfer => "course_point_transfer_protocol",
            ProtocolRole::CourseLimitsTransfer => "course_limits_transfer_protocol",
            ProtocolRole::CourseTrackTransfer => "course_track_transfer_protocol",
            ProtocolRole::ExternalTimeSync => "external_time_data_sync_protocol",
        }
    }

    /// Which role a negotiated protocol tag fills, if any.
    pub fn for_protocol(id: ProtocolId) -> Option<ProtocolRole> {
        let role = match (id.kind, id.number) {
            (b'L', 0..=2) => ProtocolRole::Link,
            (b'A', 10) | (b'A', 11) => ProtocolRole::DeviceCommand,
            (b'T', 1) => ProtocolRole::Transmission,
            (b'A', 100) => ProtocolRole::WaypointTransfer,
            (b'A', 101) => ProtocolRole::WaypointCategoryTransfer,
            (b'A', 200) | (b'A', 201) => ProtocolRole::RouteTransfer,
            (b'A', 300) | (b'A', 301) | (b'A', 302) => ProtocolRole::TrackLogTransfer,
            (b'A', 400) => ProtocolRole::ProximityWaypointTransfer,
            (b'A', 500) => ProtocolRole::AlmanacTransfer,
            (b'A', 600) => ProtocolRole::DateAndTimeInitialization,
            (b'A', 650) => ProtocolRole::FlightbookTransfer,
            (b'A', 700) => ProtocolRole::PositionInitialization,
            (b'A', 800) => ProtocolRole::Pvt,
            (b'A', 900) => ProtocolRole::MapTransfer,
            (b'A', 902) => ProtocolRole::MapUnlock,
            (b'A', 906) => ProtocolRole::LapTransfer,
            (b'A', 1000) => ProtocolRole::RunTransfer,
            (b'A', 1002) => ProtocolRole::WorkoutTransfer,
            (b'A', 1003) => ProtocolRole::WorkoutOccurrenceTransfer,
            (b'A', 1004) => ProtocolRole::FitnessUserProfileTransfer,
            (b'A', 1005) => ProtocolRole::WorkoutLimitsTransfer,
            (b'A', 1006) => ProtocolRole::CourseTransfer,
            (b'A', 1007) => ProtocolRole::CourseLapTransfer,
            (b'A', 1008) => ProtocolRole::CoursePointTransfer,
            (b'A', 1009) => ProtocolRole::CourseLimitsTransfer,
            (b'A', 1012) => ProtocolRole::CourseTrackTransfer,
            (b'A', 1051) => ProtocolRole::ExternalTimeSync,
            _ => return None,
        };
        Some(role)
    }
}

/// A registered protocol: its tag plus the datatype schemas in positional
/// order (`D0` first).
#[derive(Debug, Clone)]
pub struct ProtocolBinding {
    pub protocol: ProtocolId,
    pub datatypes: Vec<&'static Schema>,
}

/// The per-session role table.
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    bindings: HashMap<ProtocolRole, ProtocolBinding>,
}

impl ProtocolRegistry {
    /// Register every known protocol from a capability set. Protocols that
    /// map to no role and datatypes with no schema are logged and skipped;
    /// a protocol whose datatype list cannot be fully resolved is dropped
    /// because the schemas are positional.
    pub fn build(capabilities: &[Capability]) -> ProtocolRegistry {
        let mut bindings = HashMap::new();
        for capability in capabilities {
            let id = capability.protocol;
            let Some(role) = ProtocolRole::for_protocol(id) else {
                info!("Ignore undocumented protocol {id}.");
                continue;
            };
            let mut datatypes = Vec::with_capacity(capability.datatypes.len());
            let mut resolved = true;
            for &tag in &capability.datatypes {
                match datatype_schema(tag) {
                    Some(schema) => datatypes.push(schema),
                    None => {
                        warn!("Unknown datatype D{tag:03} for protocol {id}. Skipping {id}.");
                        resolved = false;
                        break;
                    }
                }
            }
            if !resolved {
                continue;
            }
            info!("Register protocol {id}.");
            bindings.insert(role, ProtocolBinding { protocol: id, datatypes });
        }
        debug!("Registered {} protocols", bindings.len());
        ProtocolRegistry { bindings }
    }

    pub fn get(&self, role: ProtocolRole) -> Option<&ProtocolBinding> {
        self.bindings.get(&role)
    }

    pub fn require(&self, role: ProtocolRole) -> Result<&ProtocolBinding, ProtocolError> {
        self.bindings
            .get(&role)
            .ok_or(ProtocolError::Unsupported(role.name()))
    }

    /// The negotiated link protocol, L000 when the device reported none.
    pub fn link_protocol(&self) -> LinkProtocol {
        match self.get(ProtocolRole::Link).map(|b| b.protocol.number) {
            Some(1) => LinkProtocol::L001,
            Some(2) => LinkProtocol::L002,
            _ => LinkProtocol::L000,
        }
    }

    /// The negotiated device command protocol.
    pub fn command_protocol(&self) -> Option<CommandProtocol> {
        match self.get(ProtocolRole::DeviceCommand).map(|b| b.protocol.number) {
            Some(10) => Some(CommandProtocol::A010),
            Some(11) => Some(CommandProtocol::A011),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::lookup_capabilities;

    #[test]
    fn registry_for_product_62() {
        // Product id 62 at firmware 2.10 resolves to L001, A010, A100/D100,
        // A200/D201/D100, A300/D300, A500/D500 plus the implicit A000,
        // A600/D600, and A700/D700.
        let capabilities = lookup_capabilities(62, 2.10).unwrap();
        let registry = ProtocolRegistry::build(&capabilities);
        assert_eq!(registry.link_protocol(), LinkProtocol::L001);
        assert_eq!(registry.command_protocol(), Some(CommandProtocol::A010));

        let waypoint = registry.get(ProtocolRole::WaypointTransfer).unwrap();
        assert_eq!(waypoint.protocol.to_string(), "A100");
        assert_eq!(waypoint.datatypes.len(), 1);
        assert_eq!(waypoint.datatypes[0].name, "D100");

        let route = registry.get(ProtocolRole::RouteTransfer).unwrap();
        let names: Vec<_> = route.datatypes.iter().map(|s| s.name).collect();
        assert_eq!(names, ["D201", "D100"]);

        let track = registry.get(ProtocolRole::TrackLogTransfer).unwrap();
        assert_eq!(track.datatypes[0].name, "D300");

        let almanac = registry.get(ProtocolRole::AlmanacTransfer).unwrap();
        assert_eq!(almanac.datatypes[0].name, "D500");

        let time = registry.get(ProtocolRole::DateAndTimeInitialization).unwrap();
        assert_eq!(time.datatypes[0].name, "D600");
        let posn = registry.get(ProtocolRole::PositionInitialization).unwrap();
        assert_eq!(posn.datatypes[0].name, "D700");

        assert!(registry.get(ProtocolRole::Pvt).is_none());
        assert!(matches!(
            registry.require(ProtocolRole::Pvt),
            Err(ProtocolError::Unsupported("pvt_protocol"))
        ));
    }

    #[test]
    fn registry_is_deterministic() {
        let capabilities = lookup_capabilities(62, 2.10).unwrap();
        let a = ProtocolRegistry::build(&capabilities);
        let b = ProtocolRegistry::build(&capabilities);
        for role in [
            ProtocolRole::WaypointTransfer,
            ProtocolRole::RouteTransfer,
            ProtocolRole::TrackLogTransfer,
        ] {
            let left = a.get(role).unwrap();
            let right = b.get(role).unwrap();
            assert_eq!(left.protocol, right.protocol);
            let l: Vec<_> = left.datatypes.iter().map(|s| s.name).collect();
            let r: Vec<_> = right.datatypes.iter().map(|s| s.name).collect();
            assert_eq!(l, r);
        }
    }

    #[test]
    fn unknown_datatype_drops_the_protocol() {
        let capabilities = vec![Capability {
            protocol: ProtocolId::new(b'A', 100),
            datatypes: vec![999],
        }];
        let registry = ProtocolRegistry::build(&capabilities);
        assert!(registry.get(ProtocolRole::WaypointTransfer).is_none());
    }
}
