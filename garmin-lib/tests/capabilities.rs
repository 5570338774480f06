//! Capability resolution: A001 parsing, the fallback table, and registry
//! construction.

use garmin_lib::capability::{lookup_capabilities, parse_protocol_array, ProtocolId};
use garmin_lib::registry::{ProtocolRegistry, ProtocolRole};
use garmin_lib::{CommandProtocol, LinkProtocol};

fn array(entries: &[(u8, u16)]) -> Vec<u8> {
    let mut data = Vec::new();
    for &(tag, number) in entries {
        data.push(tag);
        data.extend_from_slice(&number.to_le_bytes());
    }
    data
}

#[test]
fn product_62_registry_matches_the_documented_set() {
    // Product id 62, firmware 2.10: the fallback table supplies L001, A010,
    // A100/D100, A200/D201/D100, A300/D300, A500/D500, and every device
    // implicitly gets A000, A600/D600, and A700/D700.
    let capabilities = lookup_capabilities(62, 2.10).unwrap();
    let registry = ProtocolRegistry::build(&capabilities);

    assert_eq!(registry.link_protocol(), LinkProtocol::L001);
    assert_eq!(registry.command_protocol(), Some(CommandProtocol::A010));

    let expected = [
        (ProtocolRole::WaypointTransfer, "A100", vec!["D100"]),
        (ProtocolRole::RouteTransfer, "A200", vec!["D201", "D100"]),
        (ProtocolRole::TrackLogTransfer, "A300", vec!["D300"]),
        (ProtocolRole::AlmanacTransfer, "A500", vec!["D500"]),
        (ProtocolRole::DateAndTimeInitialization, "A600", vec!["D600"]),
        (ProtocolRole::PositionInitialization, "A700", vec!["D700"]),
    ];
    for (role, protocol, datatypes) in expected {
        let binding = registry.get(role).unwrap_or_else(|| panic!("{}", role.name()));
        assert_eq!(binding.protocol.to_string(), protocol);
        let names: Vec<_> = binding.datatypes.iter().map(|s| s.name).collect();
        assert_eq!(names, datatypes, "{}", role.name());
    }

    for role in [
        ProtocolRole::Pvt,
        ProtocolRole::LapTransfer,
        ProtocolRole::MapTransfer,
        ProtocolRole::ProximityWaypointTransfer,
    ] {
        assert!(registry.get(role).is_none(), "{}", role.name());
    }
}

#[test]
fn a001_report_of_a_fitness_device() {
    // A protocol array as a Forerunner-class device reports it.
    let data = array(&[
        (b'P', 0),
        (b'L', 1),
        (b'A', 10),
        (b'A', 100),
        (b'D', 110),
        (b'A', 201),
        (b'D', 202),
        (b'D', 110),
        (b'D', 210),
        (b'A', 301),
        (b'D', 310),
        (b'D', 301),
        (b'A', 500),
        (b'D', 501),
        (b'A', 600),
        (b'D', 600),
        (b'A', 700),
        (b'D', 700),
        (b'A', 800),
        (b'D', 800),
        (b'A', 906),
        (b'D', 1001),
        (b'A', 1000),
        (b'D', 1009),
    ]);
    let capabilities = parse_protocol_array(&data).unwrap();
    let registry = ProtocolRegistry::build(&capabilities);

    let route = registry.get(ProtocolRole::RouteTransfer).unwrap();
    assert_eq!(route.protocol, ProtocolId::new(b'A', 201));
    let names: Vec<_> = route.datatypes.iter().map(|s| s.name).collect();
    assert_eq!(names, ["D202", "D110", "D210"]);

    let runs = registry.get(ProtocolRole::RunTransfer).unwrap();
    assert_eq!(runs.datatypes[0].name, "D1009");
    assert_eq!(
        registry.get(ProtocolRole::LapTransfer).unwrap().datatypes[0].name,
        "D1001"
    );
    assert!(registry.get(ProtocolRole::Pvt).is_some());
}

#[test]
fn capability_resolution_is_deterministic_across_runs() {
    for _ in 0..3 {
        let capabilities = lookup_capabilities(62, 2.10).unwrap();
        let registry = ProtocolRegistry::build(&capabilities);
        let binding = registry.get(ProtocolRole::RouteTransfer).unwrap();
        let names: Vec<_> = binding.datatypes.iter().map(|s| s.name).collect();
        assert_eq!(names, ["D201", "D100"]);
    }
}

#[test]
fn firmware_version_selects_the_row() {
    // GPS 12 XL: waypoints are D100 on 2.x firmware and D103 from 3.01 on.
    let d100 = lookup_capabilities(77, 2.99).unwrap();
    let registry = ProtocolRegistry::build(&d100);
    assert_eq!(
        registry.get(ProtocolRole::WaypointTransfer).unwrap().datatypes[0].name,
        "D100"
    );
    let d103 = lookup_capabilities(77, 3.01).unwrap();
    let registry = ProtocolRegistry::build(&d103);
    assert_eq!(
        registry.get(ProtocolRole::WaypointTransfer).unwrap().datatypes[0].name,
        "D103"
    );
}

#[test]
fn aviation_devices_use_l002_and_a011() {
    let capabilities = lookup_capabilities(98, 1.0).unwrap();
    let registry = ProtocolRegistry::build(&capabilities);
    assert_eq!(registry.link_protocol(), LinkProtocol::L002);
    assert_eq!(registry.command_protocol(), Some(CommandProtocol::A011));
    // No track log on panel-mounted aviation devices.
    assert!(registry.get(ProtocolRole::TrackLogTransfer).is_none());
    assert_eq!(
        registry.get(ProtocolRole::ProximityWaypointTransfer).unwrap().datatypes[0].name,
        "D450"
    );
}
