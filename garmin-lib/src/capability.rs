//! Capability negotiation.
//!
//! After A000 product data, a device that supports A001 sends a protocol
//! array: a sequence of tagged 16-bit ids. The tag letter says what kind of
//! id follows; the array order associates datatypes with the protocol that
//! precedes them, so `A201 D202 D210` reads as "route transfer A201 with
//! D0 = D202 and D1 = D210".
//!
//! Devices that predate A001 are covered by a fallback table keyed by
//! product id, with one row per firmware range.

use crate::datatype::PROTOCOL_ARRAY;
use crate::error::{GarminError, ProtocolError};
use crate::schema::Value;
use std::fmt;
use tracing::{info, warn};

/// A protocol or datatype id: a tag letter plus a 3-digit (or longer)
/// number, e.g. `A100`, `L001`, `D800`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolId {
    /// ASCII tag letter: `P`, `T`, `L`, `A`, or `D`.
    pub kind: u8,
    pub number: u16,
}

impl ProtocolId {
    pub const fn new(kind: u8, number: u16) -> Self {
        ProtocolId { kind, number }
    }

    /// Parse a textual tag such as `"A100"`.
    pub fn parse(tag: &str) -> Option<ProtocolId> {
        let kind = *tag.as_bytes().first()?;
        if !kind.is_ascii_uppercase() {
            return None;
        }
        let number = tag[1..].parse().ok()?;
        Some(ProtocolId { kind, number })
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", char::from(self.kind), self.number)
    }
}

/// One protocol with its positionally-ordered datatypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub protocol: ProtocolId,
    pub datatypes: Vec<u16>,
}

impl Capability {
    fn new(protocol: ProtocolId) -> Self {
        Capability { protocol, datatypes: Vec::new() }
    }
}

/// Decode an A001 protocol array payload into capability groups.
///
/// Physical tags are ignored (the transport is already chosen); each
/// transmission, link, or application tag opens a new group; each datatype
/// tag appends to the most recent group; unknown tags are skipped.
pub fn parse_protocol_array(data: &[u8]) -> Result<Vec<Capability>, GarminError> {
    let record = PROTOCOL_ARRAY.unpack(data)?;
    let entries = record
        .get("protocol_array")
        .and_then(Value::as_list)
        .ok_or(ProtocolError::Schema {
            schema: "ProtocolArray",
            message: "missing protocol array".into(),
        })?;
    let mut capabilities: Vec<Capability> = Vec::new();
    for entry in entries {
        let (tag, number) = match entry.as_tuple() {
            Some([Value::U8(tag), Value::U16(number)]) => (*tag, *number),
            _ => continue,
        };
        let id = ProtocolId::new(tag, number);
        match tag {
            b'P' => info!("Got physical protocol '{id}'. Ignoring..."),
            b'T' | b'L' | b'A' => {
                info!("Got protocol '{id}'. Adding...");
                capabilities.push(Capability::new(id));
            }
            b'D' => {
                info!("Got datatype '{id}'. Adding...");
                match capabilities.last_mut() {
                    Some(group) => group.datatypes.push(number),
                    None => warn!("Datatype '{id}' without a preceding protocol. Ignoring..."),
                }
            }
            _ => info!("Got unknown protocol or datatype '{id}'. Ignoring..."),
        }
    }
    Ok(capabilities)
}

/// One fallback row: the minimum firmware version it applies to, and the
/// protocol set as (protocol tag, datatype tags).
type Row = (f32, &'static [(&'static str, &'static [&'static str])]);

/// Supported protocols of the devices that do not implement A001, keyed by
/// product id. Rows are ordered by ascending minimum version; the last row
/// whose minimum is at or below the device's firmware wins. A000, A600/D600,
/// A700/D700, and the physical layer are implied for every row and added by
/// [`lookup_capabilities`].
static DEVICE_PROTOCOL_CAPABILITIES: &[(u16, &[Row])] = &[
    (7, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A500", &["D500"])])]),
    (13, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (14, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (15, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D151"]), ("A200", &["D200", "D151"]), ("A400", &["D151"]), ("A500", &["D500"])])]),
    (18, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (20, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D550"])])]),
    (22, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D200", "D152"]), ("A300", &["D300"]), ("A400", &["D152"]), ("A500", &["D500"]), ("A903", &[])])]),
    (23, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (24, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (25, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (29, &[
        (0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D101"]), ("A200", &["D201", "D101"]), ("A300", &["D300"]), ("A400", &["D101"]), ("A500", &["D500"])]),
        (4.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D102"]), ("A200", &["D201", "D102"]), ("A300", &["D300"]), ("A400", &["D102"]), ("A500", &["D500"])]),
    ]),
    (31, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (33, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D550"])])]),
    (34, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D550"])])]),
    (35, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (36, &[
        (0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D200", "D152"]), ("A300", &["D300"]), ("A400", &["D152"]), ("A500", &["D500"]), ("A903", &[])]),
        (3.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D200", "D152"]), ("A300", &["D300"]), ("A500", &["D500"]), ("A903", &[])]),
    ]),
    (39, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D151"]), ("A200", &["D201", "D151"]), ("A300", &["D300"]), ("A500", &["D500"]), ("A903", &[])])]),
    (41, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (42, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D200", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D500"])])]),
    (44, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D101"]), ("A200", &["D201", "D101"]), ("A300", &["D300"]), ("A400", &["D101"]), ("A500", &["D500"])])]),
    (45, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D201", "D152"]), ("A300", &["D300"]), ("A500", &["D500"]), ("A903", &[])])]),
    (47, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (48, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D154"]), ("A200", &["D201", "D154"]), ("A300", &["D300"]), ("A500", &["D501"]), ("A903", &[])])]),
    (49, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D102"]), ("A200", &["D201", "D102"]), ("A300", &["D300"]), ("A400", &["D102"]), ("A500", &["D501"])])]),
    (50, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D201", "D152"]), ("A300", &["D300"]), ("A500", &["D501"])])]),
    (52, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D550"])])]),
    (53, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D201", "D152"]), ("A300", &["D300"]), ("A500", &["D501"]), ("A903", &[])])]),
    (55, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (56, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (59, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (61, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (62, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (64, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D551"])])]),
    (71, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D155"]), ("A200", &["D201", "D155"]), ("A300", &["D300"]), ("A500", &["D501"])])]),
    (72, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D104"]), ("A200", &["D201", "D104"]), ("A300", &["D300"]), ("A500", &["D501"])])]),
    (73, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A500", &["D501"])])]),
    (74, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A500", &["D500"])])]),
    (76, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D102"]), ("A200", &["D201", "D102"]), ("A300", &["D300"]), ("A400", &["D102"]), ("A500", &["D501"])])]),
    (77, &[
        (0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D100"]), ("A200", &["D201", "D100"]), ("A300", &["D300"]), ("A400", &["D400"]), ("A500", &["D501"])]),
        (3.01, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])]),
        (3.50, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A500", &["D501"])]),
        (3.61, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])]),
    ]),
    (87, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (88, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D102"]), ("A200", &["D201", "D102"]), ("A300", &["D300"]), ("A400", &["D102"]), ("A500", &["D501"])])]),
    (95, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (96, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (97, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A500", &["D501"])])]),
    (98, &[(0.0, &[("L002", &[]), ("A011", &[]), ("A100", &["D150"]), ("A200", &["D201", "D150"]), ("A400", &["D450"]), ("A500", &["D551"])])]),
    (100, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (105, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (106, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D103"]), ("A200", &["D201", "D103"]), ("A300", &["D300"]), ("A400", &["D403"]), ("A500", &["D501"])])]),
    (112, &[(0.0, &[("L001", &[]), ("A010", &[]), ("A100", &["D152"]), ("A200", &["D201", "D152"]), ("A300", &["D300"]), ("A500", &["D501"]), ("A903", &[])])]),
];

/// Look up the capability set of a device that did not report one.
///
/// Returns `None` for unknown products. Every matched row implicitly
/// includes the physical layer, A000, A600/D600, and A700/D700, which all
/// devices support.
pub fn lookup_capabilities(product_id: u16, software_version: f32) -> Option<Vec<Capability>> {
    let rows = DEVICE_PROTOCOL_CAPABILITIES
        .iter()
        .find(|&&(id, _)| id == product_id)?
        .1;
    let mut selected: Option<&Row> = None;
    for row in rows {
        if row.0 <= software_version {
            selected = Some(row);
        }
    }
    let (_, entries) = selected?;
    let mut capabilities: Vec<Capability> = entries
        .iter()
        .map(|&(tag, datatypes)| Capability {
            protocol: ProtocolId::parse(tag).expect("static table tag"),
            datatypes: datatypes
                .iter()
                .map(|d| ProtocolId::parse(d).expect("static table datatype").number)
                .collect(),
        })
        .collect();
    capabilities.push(Capability::new(ProtocolId::new(b'P', 0)));
    capabilities.push(Capability::new(ProtocolId::new(b'A', 0)));
    capabilities.push(Capability { protocol: ProtocolId::new(b'A', 600), datatypes: vec![600] });
    capabilities.push(Capability { protocol: ProtocolId::new(b'A', 700), datatypes: vec![700] });
    Some(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(kind: u8, number: u16) -> [u8; 3] {
        let n = number.to_le_bytes();
        [kind, n[0], n[1]]
    }

    #[test]
    fn protocol_id_formatting() {
        assert_eq!(ProtocolId::new(b'A', 100).to_string(), "A100");
        assert_eq!(ProtocolId::new(b'L', 1).to_string(), "L001");
        assert_eq!(ProtocolId::new(b'A', 1006).to_string(), "A1006");
        assert_eq!(ProtocolId::parse("D800"), Some(ProtocolId::new(b'D', 800)));
        assert_eq!(ProtocolId::parse(""), None);
    }

    #[test]
    fn protocol_array_groups_datatypes_positionally() {
        let mut data = Vec::new();
        for t in [
            tag(b'P', 0),
            tag(b'L', 1),
            tag(b'A', 10),
            tag(b'A', 100),
            tag(b'D', 110),
            tag(b'A', 201),
            tag(b'D', 202),
            tag(b'D', 110),
            tag(b'D', 210),
        ] {
            data.extend_from_slice(&t);
        }
        let capabilities = parse_protocol_array(&data).unwrap();
        assert_eq!(capabilities.len(), 4);
        assert_eq!(capabilities[0].protocol, ProtocolId::new(b'L', 1));
        assert!(capabilities[0].datatypes.is_empty());
        assert_eq!(capabilities[2].datatypes, vec![110]);
        assert_eq!(capabilities[3].protocol, ProtocolId::new(b'A', 201));
        assert_eq!(capabilities[3].datatypes, vec![202, 110, 210]);
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut data = Vec::new();
        for t in [tag(b'X', 9), tag(b'A', 100), tag(b'D', 100)] {
            data.extend_from_slice(&t);
        }
        let capabilities = parse_protocol_array(&data).unwrap();
        assert_eq!(capabilities.len(), 1);
        assert_eq!(capabilities[0].datatypes, vec![100]);
    }

    #[test]
    fn leading_datatype_without_protocol_is_dropped() {
        let mut data = Vec::new();
        for t in [tag(b'D', 100), tag(b'A', 100)] {
            data.extend_from_slice(&t);
        }
        let capabilities = parse_protocol_array(&data).unwrap();
        assert_eq!(capabilities.len(), 1);
        assert!(capabilities[0].datatypes.is_empty());
    }

    #[test]
    fn fallback_for_product_62() {
        let capabilities = lookup_capabilities(62, 2.10).unwrap();
        let tags: Vec<String> = capabilities.iter().map(|c| c.protocol.to_string()).collect();
        assert_eq!(
            tags,
            ["L001", "A010", "A100", "A200", "A300", "A500", "P000", "A000", "A600", "A700"]
        );
        let a200 = capabilities.iter().find(|c| c.protocol.to_string() == "A200").unwrap();
        assert_eq!(a200.datatypes, vec![201, 100]);
        let a600 = capabilities.iter().find(|c| c.protocol.to_string() == "A600").unwrap();
        assert_eq!(a600.datatypes, vec![600]);
    }

    #[test]
    fn versioned_rows_pick_greatest_minimum_at_or_below() {
        // GPS 12 XL (product 77): D100 waypoints before 3.01, D103 after,
        // proximity dropped in the 3.50 row and restored in 3.61.
        let old = lookup_capabilities(77, 2.0).unwrap();
        assert!(old.iter().any(|c| c.datatypes == vec![100]));
        let v350 = lookup_capabilities(77, 3.55).unwrap();
        assert!(!v350.iter().any(|c| c.protocol.to_string() == "A400"));
        let new = lookup_capabilities(77, 3.61).unwrap();
        assert!(new.iter().any(|c| c.protocol.to_string() == "A400"));
    }

    #[test]
    fn unknown_product_is_none() {
        assert_eq!(lookup_capabilities(9999, 1.0), None);
    }

    #[test]
    fn lookup_is_deterministic() {
        let a = lookup_capabilities(62, 2.10).unwrap();
        let b = lookup_capabilities(62, 2.10).unwrap();
        assert_eq!(a, b);
    }
}
