//! Semantic views over decoded records.
//!
//! Everything here is layered on top of [`crate::schema::Record`]: the
//! decoders read field values and translate them into degrees, timestamps,
//! and documented enumeration names. They never mutate the raw record.

use crate::datatype::{INVALID_SEMICIRCLE, INVALID_TIME_ALT, UNKNOWN_FLOAT, UNKNOWN_TIME};
use crate::schema::{Record, Value};
use crate::symbol::symbol_name;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// 12:00 AM December 31, 1989 UTC, the zero point of Garmin timestamps.
pub fn garmin_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(631_065_600, 0).expect("valid epoch")
}

/// Translate a Garmin timestamp (seconds since the epoch) to UTC.
/// `0xFFFFFFFF` means unknown.
pub fn garmin_datetime(seconds: u32) -> Option<DateTime<Utc>> {
    if seconds == UNKNOWN_TIME {
        return None;
    }
    Some(garmin_epoch() + TimeDelta::seconds(i64::from(seconds)))
}

/// Inverse of [`garmin_datetime`].
pub fn to_garmin_time(datetime: DateTime<Utc>) -> u32 {
    (datetime - garmin_epoch()).num_seconds().max(0) as u32
}

/// Whether a track-point time is usable. The device ignores host-supplied
/// times; some devices use 0x7FFFFFFF or 0xFFFFFFFF instead of zero for an
/// invalid value.
pub fn is_valid_track_time(time: u32) -> bool {
    !(time == 0 || time == UNKNOWN_TIME || time == INVALID_TIME_ALT)
}

/// Whether a float parameter carries a value; 1.0e25 means unsupported or
/// unknown.
pub fn is_valid_float(value: f32) -> bool {
    value != UNKNOWN_FLOAT
}

/// A position in semicircles, where 2^31 semicircles equal 180 degrees.
/// North and east are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub lat: i32,
    pub lon: i32,
}

impl Position {
    pub fn to_degrees(self) -> DegreePosition {
        let scale = 180.0 / 2f64.powi(31);
        DegreePosition { lat: f64::from(self.lat) * scale, lon: f64::from(self.lon) * scale }
    }

    pub fn to_radians(self) -> RadianPosition {
        let scale = std::f64::consts::PI / 2f64.powi(31);
        RadianPosition { lat: f64::from(self.lat) * scale, lon: f64::from(self.lon) * scale }
    }

    /// Both members equal to 0x7FFFFFFF marks an invalid position.
    pub fn is_valid(self) -> bool {
        !(self.lat == INVALID_SEMICIRCLE && self.lon == INVALID_SEMICIRCLE)
    }

    /// Read a `(i i)` position tuple.
    pub fn from_value(value: &Value) -> Option<Position> {
        match value.as_tuple()? {
            [Value::I32(lat), Value::I32(lon)] => Some(Position { lat: *lat, lon: *lon }),
            _ => None,
        }
    }
}

/// A position in radians, as used by D700 and PVT.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadianPosition {
    pub lat: f64,
    pub lon: f64,
}

impl RadianPosition {
    pub fn to_degrees(self) -> DegreePosition {
        DegreePosition { lat: self.lat.to_degrees(), lon: self.lon.to_degrees() }
    }

    pub fn to_semicircles(self) -> Position {
        let scale = 2f64.powi(31) / std::f64::consts::PI;
        Position {
            lat: (self.lat * scale).round() as i32,
            lon: (self.lon * scale).round() as i32,
        }
    }

    pub fn from_value(value: &Value) -> Option<RadianPosition> {
        match value.as_tuple()? {
            [Value::F64(lat), Value::F64(lon)] => Some(RadianPosition { lat: *lat, lon: *lon }),
            _ => None,
        }
    }
}

/// A position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DegreePosition {
    pub lat: f64,
    pub lon: f64,
}

impl DegreePosition {
    pub fn to_semicircles(self) -> Position {
        let scale = 2f64.powi(31) / 180.0;
        Position {
            lat: (self.lat * scale).round() as i32,
            lon: (self.lon * scale).round() as i32,
        }
    }
}

/// Decode a Latin-1 byte string, stopping at the first NUL.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// Display colors shared by the D108 and later waypoint and track types.
/// Unknown codes (255 on D108, 31 on D109) decode as `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    DarkRed = 1,
    DarkGreen = 2,
    DarkYellow = 3,
    DarkBlue = 4,
    DarkMagenta = 5,
    DarkCyan = 6,
    LightGray = 7,
    DarkGray = 8,
    Red = 9,
    Green = 10,
    Yellow = 11,
    Blue = 12,
    Magenta = 13,
    Cyan = 14,
    White = 15,
    Transparent = 16,
    #[num_enum(default)]
    Default = 255,
}

/// How a waypoint is drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayMode {
    SymbolWithName,
    SymbolOnly,
    SymbolWithComment,
}

/// D103 display values: 0 name, 1 symbol only, 2 comment.
pub fn display_mode_d103(value: u8) -> DisplayMode {
    match value {
        1 => DisplayMode::SymbolOnly,
        2 => DisplayMode::SymbolWithComment,
        _ => DisplayMode::SymbolWithName,
    }
}

/// D104 and D155 display values: 1 symbol only, 3 name, 5 comment.
pub fn display_mode_d104(value: u8) -> DisplayMode {
    match value {
        3 => DisplayMode::SymbolWithName,
        5 => DisplayMode::SymbolWithComment,
        _ => DisplayMode::SymbolOnly,
    }
}

/// The packed display-and-color byte of D109 and D110: bits 0-4 are the
/// color, bits 5-6 the display attribute, bit 7 must be zero.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayColor {
    pub color: B5,
    pub dspl: B2,
    #[skip]
    unused: B1,
}

impl DisplayColor {
    pub fn color_value(self) -> Color {
        Color::from_primitive(self.color())
    }

    pub fn display_mode(self) -> DisplayMode {
        match self.dspl() {
            1 => DisplayMode::SymbolOnly,
            2 => DisplayMode::SymbolWithComment,
            _ => DisplayMode::SymbolWithName,
        }
    }
}

/// Waypoint classes of the D108/D109/D110 family. Invalid values decode as
/// `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum WaypointClass {
    #[num_enum(default)]
    User = 0,
    AviationAirport = 64,
    AviationIntersection = 65,
    AviationNdb = 66,
    AviationVor = 67,
    AviationAirportRunway = 68,
    AviationAirportIntersection = 69,
    AviationAirportNdb = 70,
    MapPoint = 128,
    MapArea = 129,
    MapIntersection = 130,
    MapAddress = 131,
    MapLine = 132,
}

/// The aviation datatypes reuse small per-type class tables whose value
/// assignments differ; the names below preserve the documented mapping for
/// each type.
pub fn aviation_class_name(schema_name: &str, value: u8) -> &'static str {
    let table: &[&'static str] = match schema_name {
        "D151" => &["apt_wpt_class", "vor_wpt_class", "usr_wpt_class", "locked_wpt_class"],
        "D152" | "D155" => &[
            "apt_wpt_class",
            "int_wpt_class",
            "ndb_wpt_class",
            "vor_wpt_class",
            "usr_wpt_class",
            "locked_wpt_class",
        ],
        "D154" => &[
            "apt_wpt_class",
            "int_wpt_class",
            "ndb_wpt_class",
            "vor_wpt_class",
            "usr_wpt_class",
            "rwy_wpt_class",
            "aint_wpt_class",
            "andb_wpt_class",
            "sym_wpt_class",
            "locked_wpt_class",
        ],
        // D150 and D450
        _ => &[
            "apt_wpt_class",
            "int_wpt_class",
            "ndb_wpt_class",
            "vor_wpt_class",
            "usr_wpt_class",
            "rwy_wpt_class",
            "aint_wpt_class",
            "locked_wpt_class",
        ],
    };
    table.get(value as usize).copied().unwrap_or("usr_wpt_class")
}

/// Route link classes (D210).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize)]
#[repr(u16)]
pub enum LinkClass {
    #[num_enum(default)]
    Line = 0,
    Link = 1,
    Net = 2,
    Direct = 3,
    Snap = 255,
}

/// Position fix values of D800. Legacy firmware uses values one greater;
/// pass `legacy` accordingly (see [`is_legacy_product`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u16)]
pub enum Fix {
    Unusable = 0,
    Invalid = 1,
    TwoD = 2,
    ThreeD = 3,
    TwoDDiff = 4,
    ThreeDDiff = 5,
}

impl Fix {
    pub fn from_wire(value: u16, legacy: bool) -> Option<Fix> {
        let value = if legacy { value.checked_sub(1)? } else { value };
        Fix::try_from_primitive(value).ok()
    }
}

/// Devices whose older firmware reports fix values offset by one, keyed by
/// the lowercased device name from the product description, with the last
/// firmware version still affected. The specification's own device list is
/// ambiguous, so this stays an explicit opt-in for callers.
const LEGACY_FIX_DEVICES: &[(&str, f32)] = &[
    ("emap", 2.64),
    ("gpsmap 162", 2.62),
    ("gpsmap 295", 2.19),
    ("etrex", 2.10),
    ("streetpilot iii", 2.10),
    ("etrex japanese", 2.10),
    ("etrex venture", 2.20),
    ("etrex mariner", 2.20),
    ("etrex europe", 2.03),
    ("gps 152", 2.01),
    ("etrex chinese", 2.01),
    ("etrex vista", 2.12),
    ("etrex summit japanese", 2.01),
    ("etrex summit", 2.24),
    ("etrex golflogix", 2.49),
];

/// Whether a product description such as `"eTrex Software Version 2.10"`
/// names a device/firmware combination with the legacy fix offset.
pub fn is_legacy_product(product_description: &str) -> bool {
    let marker = " software version ";
    let lower = product_description.to_lowercase();
    let Some(at) = lower.find(marker) else {
        return false;
    };
    let device = lower[..at].trim();
    let version: f32 = match lower[at + marker.len()..].trim().parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    LEGACY_FIX_DEVICES
        .iter()
        .any(|&(name, last)| name == device && version <= last)
}

/// Sport types shared by runs and workouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum SportType {
    Running = 0,
    Biking = 1,
    #[num_enum(default)]
    Other = 2,
}

/// Lap intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum Intensity {
    Active = 0,
    Rest = 1,
}

/// Multisport membership of a run (D1009/D1010).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum Multisport {
    No = 0,
    Yes = 1,
    YesAndLastInGroup = 2,
}

/// The D1009 program-type bit field.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgram {
    pub virtual_partner: bool,
    pub workout: bool,
    pub quick_workout: bool,
    pub course: bool,
    pub interval_workout: bool,
    pub auto_multisport: bool,
    #[skip]
    unused: B2,
}

/// Lap trigger methods (D1011 and later).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum TriggerMethod {
    Manual = 0,
    Distance = 1,
    Location = 2,
    Time = 3,
    HeartRate = 4,
}

/// Course point types (D1012).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum CoursePointType {
    #[num_enum(default)]
    Generic = 0,
    Summit = 1,
    Valley = 2,
    Water = 3,
    Food = 4,
    Danger = 5,
    Left = 6,
    Right = 7,
    Straight = 8,
    FirstAid = 9,
    FourthCategory = 10,
    ThirdCategory = 11,
    SecondCategory = 12,
    FirstCategory = 13,
    HorsCategory = 14,
    Sprint = 15,
}

/// Workout step duration types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum DurationType {
    Time = 0,
    Distance = 1,
    HeartRateLessThan = 2,
    HeartRateGreaterThan = 3,
    CaloriesBurned = 4,
    Open = 5,
    Repeat = 6,
}

/// Workout step target types. Cadence only exists in D1008.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Serialize)]
#[repr(u8)]
pub enum TargetType {
    Speed = 0,
    HeartRate = 1,
    Open = 2,
    Cadence = 3,
}

/// The satellite status byte: ephemeris available, differential correction
/// available, used in the solution.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteStatus {
    pub has_ephemeris: bool,
    pub has_differential: bool,
    pub used_in_solution: bool,
    #[skip]
    unused: B5,
}

/// Sections of the screenshot stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum ScreenshotSection {
    Header = 0,
    PixelArray = 1,
    ColorTable = 2,
}

impl ScreenshotSection {
    pub fn name(self) -> &'static str {
        match self {
            ScreenshotSection::Header => "header",
            ScreenshotSection::PixelArray => "pixel_array",
            ScreenshotSection::ColorTable => "color_table",
        }
    }
}

/// Product identity acquired on session start.
#[derive(Debug, Clone, Serialize)]
pub struct ProductData {
    pub product_id: u16,
    /// Raw value divided by 100.
    pub software_version: f32,
    pub product_description: String,
}

impl ProductData {
    pub fn from_record(record: &Record) -> Option<ProductData> {
        Some(ProductData {
            product_id: record.get("product_id")?.as_u16()?,
            software_version: f32::from(record.get("software_version")?.as_i16()?) / 100.0,
            product_description: latin1_to_string(
                record.get("product_description")?.as_bytes()?,
            ),
        })
    }
}

/// A friendly waypoint summary readable from every waypoint datatype.
#[derive(Debug, Clone, Serialize)]
pub struct WaypointView {
    pub ident: String,
    pub lat: f64,
    pub lon: f64,
    pub symbol: Option<&'static str>,
    pub comment: String,
}

impl WaypointView {
    pub fn from_record(record: &Record) -> Option<WaypointView> {
        let ident = record
            .get("ident")
            .or_else(|| record.get("wpt_ident"))
            .and_then(Value::as_bytes)
            .map(latin1_to_string)
            .unwrap_or_default();
        let posn = Position::from_value(record.get("posn")?)?;
        let degrees = posn.to_degrees();
        let symbol = match record.get("smbl") {
            Some(Value::U8(v)) => symbol_name(u16::from(*v)),
            Some(Value::U16(v)) => symbol_name(*v),
            _ => None,
        };
        let comment = record
            .get("cmnt")
            .and_then(Value::as_bytes)
            .map(latin1_to_string)
            .unwrap_or_default();
        Some(WaypointView { ident, lat: degrees.lat, lon: degrees.lon, symbol, comment })
    }
}

/// A track point summary readable from D300-D304.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPointView {
    pub lat: f64,
    pub lon: f64,
    pub time: Option<DateTime<Utc>>,
    pub alt: Option<f32>,
    pub new_track: bool,
}

impl TrackPointView {
    pub fn from_record(record: &Record) -> Option<TrackPointView> {
        let posn = Position::from_value(record.get("posn")?)?;
        let degrees = posn.to_degrees();
        let time = record
            .get("time")
            .and_then(Value::as_u32)
            .filter(|&t| is_valid_track_time(t))
            .and_then(garmin_datetime);
        let alt = record
            .get("alt")
            .and_then(Value::as_f32)
            .filter(|&a| is_valid_float(a));
        let new_track = record
            .get("new_trk")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(TrackPointView { lat: degrees.lat, lon: degrees.lon, time, alt, new_track })
    }
}

/// A decoded D800 PVT packet.
#[derive(Debug, Clone, Serialize)]
pub struct PvtView {
    pub lat: f64,
    pub lon: f64,
    /// Altitude above mean sea level: `alt` plus `msl_hght`.
    pub msl_altitude: f32,
    pub fix: Option<Fix>,
    pub east: f32,
    pub north: f32,
    pub up: f32,
    pub time: Option<DateTime<Utc>>,
    pub epe: f32,
}

impl PvtView {
    pub fn from_record(record: &Record, legacy: bool) -> Option<PvtView> {
        let posn = RadianPosition::from_value(record.get("posn")?)?.to_degrees();
        let alt = record.get("alt")?.as_f32()?;
        let msl_hght = record.get("msl_hght")?.as_f32()?;
        let fix = Fix::from_wire(record.get("fix")?.as_u16()?, legacy);
        let tow = record.get("tow")?.as_f64()?;
        let leap = record.get("leap_scnds")?.as_i16()?;
        let wn_days = record.get("wn_days")?.as_u32()?;
        // Seconds since the epoch: week-number days plus time of week,
        // corrected from GPS to UTC by the leap-second count.
        let seconds = (tow - f64::from(leap)).floor() as i64;
        let time = garmin_epoch()
            .checked_add_signed(TimeDelta::days(i64::from(wn_days)))
            .map(|t| t + TimeDelta::seconds(seconds));
        Some(PvtView {
            lat: posn.lat,
            lon: posn.lon,
            msl_altitude: alt + msl_hght,
            fix,
            east: record.get("east")?.as_f32()?,
            north: record.get("north")?.as_f32()?,
            up: record.get("up")?.as_f32()?,
            time,
            epe: record.get("epe")?.as_f32()?,
        })
    }
}

/// A lap summary readable from D906, D1001, D1011, and D1015.
#[derive(Debug, Clone, Serialize)]
pub struct LapView {
    /// Unique among all laps received; absent on D906.
    pub index: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    /// Lap duration in hundredths of a second.
    pub total_time: u32,
    /// Distance in meters.
    pub total_dist: f32,
    pub max_speed: Option<f32>,
    pub begin: Option<DegreePosition>,
    pub end: Option<DegreePosition>,
    pub calories: u16,
    pub avg_heart_rate: Option<u8>,
    pub max_heart_rate: Option<u8>,
    pub intensity: Option<Intensity>,
    pub avg_cadence: Option<u8>,
    pub trigger_method: Option<TriggerMethod>,
}

impl LapView {
    pub fn from_record(record: &Record) -> Option<LapView> {
        let index = record.get("index").and_then(Value::as_uint).map(|v| v as u32);
        let position = |name: &str| {
            record
                .get(name)
                .and_then(Position::from_value)
                .filter(|p| p.is_valid())
                .map(Position::to_degrees)
        };
        // Heart rates of zero and a cadence of 0xFF mean unknown.
        let heart_rate = |name: &str| record.get(name).and_then(Value::as_u8).filter(|&v| v != 0);
        Some(LapView {
            index,
            start_time: record
                .get("start_time")
                .and_then(Value::as_u32)
                .and_then(garmin_datetime),
            total_time: record.get("total_time").and_then(Value::as_uint)? as u32,
            total_dist: record.get("total_dist")?.as_f32()?,
            max_speed: record.get("max_speed").and_then(Value::as_f32),
            begin: position("begin"),
            end: position("end"),
            calories: record.get("calories").and_then(Value::as_u16).unwrap_or(0),
            avg_heart_rate: heart_rate("avg_heart_rate"),
            max_heart_rate: heart_rate("max_heart_rate"),
            intensity: record
                .get("intensity")
                .and_then(Value::as_u8)
                .and_then(|v| Intensity::try_from_primitive(v).ok()),
            avg_cadence: record
                .get("avg_cadence")
                .and_then(Value::as_u8)
                .filter(|&v| v != 255),
            trigger_method: record
                .get("trigger_method")
                .and_then(Value::as_u8)
                .and_then(|v| TriggerMethod::try_from_primitive(v).ok()),
        })
    }
}

/// A run summary readable from D1000, D1009, and D1010.
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    /// Index of the associated track; 0xFFFF on D1009 means none.
    pub track_index: Option<u32>,
    pub first_lap_index: u32,
    pub last_lap_index: u32,
    pub sport_type: SportType,
    /// Raw program type; a plain enumeration on D1000/D1010 and the
    /// [`RunProgram`] bit field on D1009.
    pub program_type: u8,
    pub multisport: Option<Multisport>,
}

impl RunView {
    pub fn from_record(record: &Record) -> Option<RunView> {
        let track_index = record.get("track_index").and_then(Value::as_uint).and_then(|v| {
            if record.schema_name() == "D1009" && v == u64::from(crate::datatype::NO_TRACK) {
                None
            } else {
                Some(v as u32)
            }
        });
        Some(RunView {
            track_index,
            first_lap_index: record.get("first_lap_index").and_then(Value::as_uint)? as u32,
            last_lap_index: record.get("last_lap_index").and_then(Value::as_uint)? as u32,
            sport_type: SportType::from_primitive(record.get("sport_type")?.as_u8()?),
            program_type: record.get("program_type")?.as_u8()?,
            multisport: record
                .get("multisport")
                .and_then(Value::as_u8)
                .and_then(|v| Multisport::try_from_primitive(v).ok()),
        })
    }
}

/// A course point readable from D1012.
#[derive(Debug, Clone, Serialize)]
pub struct CoursePointView {
    pub name: String,
    pub course_index: u16,
    pub track_point_time: Option<DateTime<Utc>>,
    pub point_type: CoursePointType,
}

impl CoursePointView {
    pub fn from_record(record: &Record) -> Option<CoursePointView> {
        Some(CoursePointView {
            name: latin1_to_string(record.get("name")?.as_bytes()?),
            course_index: record.get("course_index")?.as_u16()?,
            track_point_time: record
                .get("track_point_time")
                .and_then(Value::as_u32)
                .and_then(garmin_datetime),
            point_type: CoursePointType::from_primitive(record.get("point_type")?.as_u8()?),
        })
    }
}

/// A flightbook entry readable from D650.
#[derive(Debug, Clone, Serialize)]
pub struct FlightbookView {
    pub takeoff_time: Option<DateTime<Utc>>,
    pub landing_time: Option<DateTime<Utc>>,
    pub takeoff: Option<DegreePosition>,
    pub landing: Option<DegreePosition>,
    pub night_time: u32,
    pub num_landings: u32,
    pub max_speed: f32,
    pub max_alt: f32,
    pub distance: f32,
    pub cross_country: bool,
    pub departure_ident: String,
    pub arrival_ident: String,
    pub aircraft_id: String,
}

impl FlightbookView {
    pub fn from_record(record: &Record) -> Option<FlightbookView> {
        let position = |name: &str| {
            record
                .get(name)
                .and_then(Position::from_value)
                .filter(|p| p.is_valid())
                .map(Position::to_degrees)
        };
        let time = |name: &str| record.get(name).and_then(Value::as_u32).and_then(garmin_datetime);
        let string = |name: &str| {
            record
                .get(name)
                .and_then(Value::as_bytes)
                .map(latin1_to_string)
                .unwrap_or_default()
        };
        Some(FlightbookView {
            takeoff_time: time("takeoff_time"),
            landing_time: time("landing_time"),
            takeoff: position("takeoff_posn"),
            landing: position("landing_posn"),
            night_time: record.get("night_time")?.as_u32()?,
            num_landings: record.get("num_landings")?.as_u32()?,
            max_speed: record.get("max_speed")?.as_f32()?,
            max_alt: record.get("max_alt")?.as_f32()?,
            distance: record.get("distance")?.as_f32()?,
            cross_country: record.get("cross_country_flag")?.as_bool()?,
            departure_ident: string("departure_ident"),
            arrival_ident: string("arrival_ident"),
            aircraft_id: string("ac_id"),
        })
    }
}

/// Calendar time from a D600 record.
pub fn datetime_from_d600(record: &Record) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        i32::from(record.get("year")?.as_u16()?),
        u32::from(record.get("month")?.as_u8()?),
        u32::from(record.get("day")?.as_u8()?),
    )?
    .and_hms_opt(
        u32::from(record.get("hour")?.as_u16()?),
        u32::from(record.get("minute")?.as_u8()?),
        u32::from(record.get("second")?.as_u8()?),
    )
}
