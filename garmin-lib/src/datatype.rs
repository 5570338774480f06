//! Datatype catalog.
//!
//! Every record layout the transfer protocols can negotiate, expressed as
//! declarative field lists in the format alphabet of [`crate::schema`] and
//! compiled lazily on first use. The D-numbered layouts mirror Garmin's
//! Device Interface Specification field for field; the unnumbered ones are
//! the protocol-plumbing structures (records counter, product data, memory
//! and image transfer framing) that never appear in a capability array.
//!
//! Records decoded through these schemas keep their raw bytes; the semantic
//! views in [`crate::semantic`] never mutate them.

use crate::schema::Schema;
use std::sync::LazyLock;

/// A time of 0xFFFFFFFF means unsupported or unknown.
pub const UNKNOWN_TIME: u32 = 0xffff_ffff;

/// Some devices use 0x7FFFFFFF instead of zero for an invalid track time.
pub const INVALID_TIME_ALT: u32 = 0x7fff_ffff;

/// A float of 1.0e25 means unsupported or unknown (altitude, depth,
/// distance, temperature).
pub const UNKNOWN_FLOAT: f32 = 1.0e25;

/// A position with both lat and lon equal to this value is invalid.
pub const INVALID_SEMICIRCLE: i32 = 0x7fff_ffff;

/// The track index of a run with no associated track.
pub const NO_TRACK: u16 = 0xffff;

macro_rules! schema {
    ($(#[$meta:meta])* $vis:vis $ident:ident, $name:literal, [$(($f:literal, $fmt:expr)),* $(,)?]) => {
        $(#[$meta])*
        $vis static $ident: LazyLock<Schema> =
            LazyLock::new(|| Schema::new($name, &[$(($f, $fmt)),*]));
    };
}

// Position and time building blocks, inlined into the layouts below:
// a semicircle position is "(i i)", a radian position "(d d)", a Garmin
// timestamp "I" (seconds since 1989-12-31T00:00:00Z).

schema!(
    /// The 16-bit count of data packets to follow, excluding the
    /// `pid_xfer_cmplt` packet.
    pub RECORDS, "Records", [("records", "H")]
);

schema!(
    /// Product data returned by A000. The description contains one or more
    /// null-terminated strings; only the first is meaningful, the rest are
    /// kept verbatim and ignored.
    pub PRODUCT_DATA, "ProductData", [
        ("product_id", "H"),
        ("software_version", "h"), // version number multiplied by 100
        ("product_description", "n"),
        ("properties", "{n}"),
    ]
);

schema!(
    /// The A001 protocol array: tag byte plus 16-bit id, repeated.
    pub PROTOCOL_ARRAY, "ProtocolArray", [("protocol_array", "{B H}")]
);

// ---- Waypoints ----

schema!(pub D100, "D100", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
]);

schema!(pub D101, "D101", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("dst", "f"), // proximity distance (meters)
    ("smbl", "B"),
]);

schema!(pub D102, "D102", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("dst", "f"),
    ("smbl", "H"),
]);

schema!(pub D103, "D103", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("smbl", "B"),
    ("dspl", "B"),
]);

schema!(pub D104, "D104", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("dst", "f"),
    ("smbl", "H"),
    ("dspl", "B"),
]);

schema!(pub D105, "D105", [
    ("posn", "(i i)"),
    ("smbl", "H"),
    ("wpt_ident", "n"),
]);

schema!(pub D106, "D106", [
    ("wpt_class", "B"),
    ("subclass", "13s"),
    ("posn", "(i i)"),
    ("smbl", "H"),
    ("wpt_ident", "n"),
    ("lnk_ident", "n"),
]);

schema!(pub D107, "D107", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("smbl", "B"),
    ("dspl", "B"),
    ("dst", "f"),
    ("color", "B"),
]);

schema!(pub D108, "D108", [
    ("wpt_class", "B"),
    ("color", "B"),
    ("dspl", "B"),
    ("attr", "B"), // 0x60 for D108
    ("smbl", "H"),
    ("subclass", "18s"),
    ("posn", "(i i)"),
    ("alt", "f"),  // invalid if 1.0e25
    ("dpth", "f"), // invalid if 1.0e25
    ("dist", "f"), // invalid if 1.0e25
    ("state", "2s"),
    ("cc", "2s"),
    ("ident", "n"),
    ("cmnt", "n"),
    ("facility", "n"),
    ("city", "n"),
    ("addr", "n"),
    ("cross_road", "n"),
]);

schema!(pub D109, "D109", [
    ("dtyp", "B"), // 0x01 for D109
    ("wpt_class", "B"),
    ("dspl_color", "B"), // bits 0-4 color, bits 5-6 display, bit 7 unused
    ("attr", "B"),       // 0x70 for D109
    ("smbl", "H"),
    ("subclass", "18s"),
    ("posn", "(i i)"),
    ("alt", "f"),
    ("dpth", "f"),
    ("dist", "f"),
    ("state", "2s"),
    ("cc", "2s"),
    ("ete", "I"), // outbound link ete in seconds, default 0xFFFFFFFF
    ("ident", "n"),
    ("cmnt", "n"),
    ("facility", "n"),
    ("city", "n"),
    ("addr", "n"),
    ("cross_road", "n"),
]);

schema!(pub D110, "D110", [
    ("dtyp", "B"), // 0x01 for D110
    ("wpt_class", "B"),
    ("dspl_color", "B"),
    ("attr", "B"), // 0x80 for D110
    ("smbl", "H"),
    ("subclass", "18s"),
    ("posn", "(i i)"),
    ("alt", "f"),
    ("dpth", "f"),
    ("dist", "f"),
    ("state", "2s"),
    ("cc", "2s"),
    ("ete", "I"),
    ("temp", "f"),    // invalid if 1.0e25
    ("time", "I"),    // invalid if 0xFFFFFFFF
    ("wpt_cat", "H"), // category membership bits
    ("ident", "n"),
    ("cmnt", "n"),
    ("facility", "n"),
    ("city", "n"),
    ("addr", "n"),
    ("cross_road", "n"),
]);

schema!(
    /// Waypoint category name.
    pub D120, "D120", [("name", "17s")]
);

schema!(pub D150, "D150", [
    ("ident", "6s"),
    ("cc", "2s"),
    ("wpt_class", "B"),
    ("posn", "(i i)"),
    ("alt", "h"),
    ("city", "24s"),
    ("state", "2s"),
    ("facility", "30s"),
    ("cmnt", "40s"),
]);

schema!(pub D151, "D151", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("dst", "f"),
    ("name", "30s"),
    ("city", "24s"),
    ("state", "2s"),
    ("alt", "h"),
    ("cc", "2s"),
    ("unused2", "B"),
    ("wpt_class", "B"),
]);

schema!(
    /// Same layout as D150; only the waypoint-class enumeration differs.
    pub D152, "D152", [
        ("ident", "6s"),
        ("cc", "2s"),
        ("wpt_class", "B"),
        ("posn", "(i i)"),
        ("alt", "h"),
        ("city", "24s"),
        ("state", "2s"),
        ("facility", "30s"),
        ("cmnt", "40s"),
    ]
);

schema!(pub D154, "D154", [
    ("ident", "6s"),
    ("cc", "2s"),
    ("wpt_class", "B"),
    ("posn", "(i i)"),
    ("alt", "h"),
    ("city", "24s"),
    ("state", "2s"),
    ("facility", "30s"),
    ("cmnt", "40s"),
    ("smbl", "H"),
]);

schema!(pub D155, "D155", [
    ("ident", "6s"),
    ("cc", "2s"),
    ("wpt_class", "B"),
    ("posn", "(i i)"),
    ("alt", "h"),
    ("city", "24s"),
    ("state", "2s"),
    ("facility", "30s"),
    ("cmnt", "40s"),
    ("smbl", "H"),
    ("dspl", "B"),
]);

// ---- Routes ----

schema!(pub D200, "D200", [("nmbr", "B")]);

schema!(pub D201, "D201", [("nmbr", "B"), ("cmnt", "20s")]);

schema!(pub D202, "D202", [("ident", "n")]);

schema!(
    /// Route link between two route waypoints.
    pub D210, "D210", [
        ("lnk_class", "H"),
        ("subclass", "18s"),
        ("ident", "n"),
    ]
);

// ---- Track logs ----

schema!(pub D300, "D300", [
    ("posn", "(i i)"),
    ("time", "I"),
    ("new_trk", "?"),
]);

schema!(pub D301, "D301", [
    ("posn", "(i i)"),
    ("time", "I"),
    ("alt", "f"),
    ("dpth", "f"),
    ("new_trk", "?"),
]);

schema!(pub D302, "D302", [
    ("posn", "(i i)"),
    ("time", "I"),
    ("alt", "f"),
    ("dpth", "f"),
    ("temp", "f"),
    ("new_trk", "?"),
]);

schema!(pub D303, "D303", [
    ("posn", "(i i)"),
    ("time", "I"),
    ("alt", "f"),
    ("heart_rate", "B"), // invalid if 0
]);

schema!(pub D304, "D304", [
    ("posn", "(i i)"),
    ("time", "I"),
    ("alt", "f"),
    ("distance", "f"),
    ("heart_rate", "B"), // invalid if 0
    ("cadence", "B"),    // invalid if 0xFF
    ("sensor", "?"),     // wheel sensor present?
]);

schema!(pub D310, "D310", [
    ("dspl", "?"), // display on the map?
    ("color", "B"),
    ("trk_ident", "n"),
]);

schema!(pub D311, "D311", [("index", "H")]);

schema!(
    /// Same layout as D310 with an extended color enumeration.
    pub D312, "D312", [
        ("dspl", "?"),
        ("color", "B"),
        ("trk_ident", "n"),
    ]
);

// ---- Proximity waypoints ----

schema!(pub D400, "D400", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("dst", "f"),
]);

schema!(pub D403, "D403", [
    ("ident", "6s"),
    ("posn", "(i i)"),
    ("unused", "I"),
    ("cmnt", "40s"),
    ("smbl", "B"),
    ("dspl", "B"),
    ("dst", "f"),
]);

schema!(pub D450, "D450", [
    ("idx", "i"),
    ("ident", "6s"),
    ("cc", "2s"),
    ("wpt_class", "B"),
    ("posn", "(i i)"),
    ("alt", "h"),
    ("city", "24s"),
    ("state", "2s"),
    ("facility", "30s"),
    ("cmnt", "40s"),
    ("dst", "f"),
]);

// ---- Almanac ----

schema!(pub D500, "D500", [
    ("wn", "H"),     // week number
    ("toa", "f"),    // almanac data reference time (s)
    ("af0", "f"),    // clock correction coefficient (s)
    ("af1", "f"),    // clock correction coefficient (s/s)
    ("e", "f"),      // eccentricity
    ("sqrta", "f"),  // square root of semi-major axis (m^1/2)
    ("m0", "f"),     // mean anomaly at reference time (r)
    ("w", "f"),      // argument of perigee (r)
    ("omg0", "f"),   // right ascension (r)
    ("odot", "f"),   // rate of right ascension (r/s)
    ("i", "f"),      // inclination angle (r)
]);

schema!(pub D501, "D501", [
    ("wn", "H"),
    ("toa", "f"),
    ("af0", "f"),
    ("af1", "f"),
    ("e", "f"),
    ("sqrta", "f"),
    ("m0", "f"),
    ("w", "f"),
    ("omg0", "f"),
    ("odot", "f"),
    ("i", "f"),
    ("hlth", "B"), // almanac health
]);

schema!(pub D550, "D550", [
    ("svid", "B"), // PRN-01..PRN-32 as 0..31
    ("wn", "H"),
    ("toa", "f"),
    ("af0", "f"),
    ("af1", "f"),
    ("e", "f"),
    ("sqrta", "f"),
    ("m0", "f"),
    ("w", "f"),
    ("omg0", "f"),
    ("odot", "f"),
    ("i", "f"),
]);

schema!(pub D551, "D551", [
    ("svid", "B"),
    ("wn", "H"),
    ("toa", "f"),
    ("af0", "f"),
    ("af1", "f"),
    ("e", "f"),
    ("sqrta", "f"),
    ("m0", "f"),
    ("w", "f"),
    ("omg0", "f"),
    ("odot", "f"),
    ("i", "f"),
    ("hlth", "B"),
]);

// ---- Date/time and position initialization ----

schema!(pub D600, "D600", [
    ("month", "B"),  // 1-12
    ("day", "B"),    // 1-31
    ("year", "H"),   // no base value, 1990 means 1990
    ("hour", "H"),   // 0-23
    ("minute", "B"),
    ("second", "B"),
]);

schema!(pub D650, "D650", [
    ("takeoff_time", "I"),
    ("landing_time", "I"),
    ("takeoff_posn", "(i i)"),
    ("landing_posn", "(i i)"),
    ("night_time", "I"),   // seconds flown in night conditions
    ("num_landings", "I"),
    ("max_speed", "f"),    // meters/second
    ("max_alt", "f"),      // above WGS84 ellipsoid, meters
    ("distance", "f"),
    ("cross_country_flag", "?"),
    ("departure_name", "n"),
    ("departure_ident", "n"),
    ("arrival_name", "n"),
    ("arrival_ident", "n"),
    ("ac_id", "n"),
]);

schema!(
    /// Position in radians.
    pub D700, "D700", [("lat", "d"), ("lon", "d")]
);

// ---- PVT ----

schema!(pub D800, "D800", [
    ("alt", "f"),        // above WGS 84 ellipsoid (meters)
    ("epe", "f"),        // estimated position error, 2 sigma (meters)
    ("eph", "f"),        // horizontal only (meters)
    ("epv", "f"),        // vertical only (meters)
    ("fix", "H"),
    ("tow", "d"),        // time of week (seconds)
    ("posn", "(d d)"),   // radians
    ("east", "f"),       // velocity east (meters/second)
    ("north", "f"),
    ("up", "f"),
    ("msl_hght", "f"),   // height of WGS84 ellipsoid above MSL (meters)
    ("leap_scnds", "h"), // difference between GPS and UTC (seconds)
    ("wn_days", "I"),    // week number days
]);

schema!(
    /// Undocumented satellite status packet interleaved with D800 on some
    /// devices: twelve fixed records of svid/snr/elevation/azimuth/status.
    pub SATELLITE, "Satellite", [("records", "12[B H B H B]")]
);

// ---- Fitness: laps, runs, workouts, courses ----

schema!(pub D906, "D906", [
    ("start_time", "I"),
    ("total_time", "I"), // hundredths of a second
    ("total_dist", "f"), // meters
    ("begin", "(i i)"),
    ("end", "(i i)"),
    ("calories", "H"),
    ("track_index", "B"),
    ("unused", "B"),
]);

// A workout is a 4-byte step count, twenty fixed step slots, a name, and a
// sport type. The nested step layout is
// `16s f f H B B B B H`: custom name, target zone bounds, duration value,
// intensity, duration type, target type, target value, unused.
const WORKOUT_FMT: &str = "(I 20[16s f f H B B B B H] 16s B)";

schema!(pub D1000, "D1000", [
    ("track_index", "I"),
    ("first_lap_index", "I"),
    ("last_lap_index", "I"),
    ("sport_type", "B"),
    ("program_type", "B"),
    ("unused", "H"),
    ("time", "I"),     // virtual partner time
    ("distance", "f"), // virtual partner distance
    ("workout", WORKOUT_FMT),
]);

schema!(pub D1001, "D1001", [
    ("index", "I"),
    ("start_time", "I"),
    ("total_time", "I"), // hundredths of a second
    ("total_dist", "f"),
    ("max_speed", "f"),  // meters per second
    ("begin", "(i i)"),
    ("end", "(i i)"),
    ("calories", "H"),
    ("avg_heart_rate", "B"), // invalid if 0
    ("max_heart_rate", "B"), // invalid if 0
    ("intensity", "B"),
]);

schema!(pub D1002, "D1002", [
    ("num_valid_steps", "I"), // 1-20
    ("steps", "20[16s f f H B B B B H]"),
    ("name", "16s"),
    ("sport_type", "B"),
]);

schema!(pub D1003, "D1003", [
    ("workout_name", "16s"),
    ("day", "I"),
]);

schema!(pub D1004, "D1004", [
    // Three activities, each: five heart-rate zones, ten speed zones, gear
    // weight, max heart rate, two unused fields.
    ("activities", "3[5[B B H] 10[f f 16s] f B B H]"),
    ("weight", "f"), // kilograms
    ("birth_year", "H"),
    ("birth_month", "B"),
    ("birth_day", "B"),
    ("gender", "B"),
]);

schema!(pub D1005, "D1005", [
    ("max_workouts", "L"),
    ("max_unscheduled_workouts", "L"),
    ("max_occurrences", "L"),
]);

schema!(pub D1006, "D1006", [
    ("index", "H"),
    ("unused", "H"),
    ("course_name", "16s"),
    ("track_index", "H"),
]);

schema!(pub D1007, "D1007", [
    ("course_index", "H"),
    ("lap_index", "H"),
    ("total_time", "L"), // hundredths of a second
    ("total_dist", "f"),
    ("begin", "(i i)"),
    ("end", "(i i)"),
    ("avg_heart_rate", "B"),
    ("max_heart_rate", "B"),
    ("intensity", "B"),
    ("avg_cadence", "B"), // invalid if 0xFF
]);

schema!(
    /// Same layout as D1002; D1008 adds the cadence target type.
    pub D1008, "D1008", [
        ("num_valid_steps", "I"),
        ("steps", "20[16s f f H B B B B H]"),
        ("name", "16s"),
        ("sport_type", "B"),
    ]
);

schema!(pub D1009, "D1009", [
    ("track_index", "H"), // 0xFFFF if no associated track
    ("first_lap_index", "H"),
    ("last_lap_index", "H"),
    ("sport_type", "B"),
    ("program_type", "B"), // bit field, see semantic::RunProgram
    ("multisport", "B"),
    ("unused1", "B"),
    ("unused2", "H"),
    ("quick_workout", "(I f)"),
    ("workout", WORKOUT_FMT),
]);

schema!(pub D1010, "D1010", [
    ("track_index", "I"),
    ("first_lap_index", "I"),
    ("last_lap_index", "I"),
    ("sport_type", "B"),
    ("program_type", "B"),
    ("multisport", "B"),
    ("unused", "B"),
    ("time", "I"),     // virtual partner time
    ("distance", "f"), // virtual partner distance
    ("workout", WORKOUT_FMT),
]);

schema!(pub D1011, "D1011", [
    ("index", "H"),
    ("unused", "H"),
    ("start_time", "I"),
    ("total_time", "I"),
    ("total_dist", "f"),
    ("max_speed", "f"),
    ("begin", "(i i)"),
    ("end", "(i i)"),
    ("calories", "H"),
    ("avg_heart_rate", "B"),
    ("max_heart_rate", "B"),
    ("intensity", "B"),
    ("avg_cadence", "B"),
    ("trigger_method", "B"),
]);

schema!(pub D1012, "D1012", [
    ("name", "11s"),
    ("unused1", "B"),
    ("course_index", "H"),
    ("unused2", "H"),
    ("track_point_time", "I"),
    ("point_type", "B"),
]);

schema!(pub D1013, "D1013", [
    ("max_courses", "I"),
    ("max_course_laps", "I"),
    ("max_course_pnt", "I"),
    ("max_course_trk_pnt", "I"),
]);

schema!(
    /// Undocumented D1011 variant with five extra bytes at the end.
    pub D1015, "D1015", [
        ("index", "H"),
        ("unused", "H"),
        ("start_time", "I"),
        ("total_time", "I"),
        ("total_dist", "f"),
        ("max_speed", "f"),
        ("begin", "(i i)"),
        ("end", "(i i)"),
        ("calories", "H"),
        ("avg_heart_rate", "B"),
        ("max_heart_rate", "B"),
        ("intensity", "B"),
        ("avg_cadence", "B"),
        ("trigger_method", "B"),
        ("unknown", "(5B)"),
    ]
);

schema!(pub D1051, "D1051", [
    ("current_utc", "I"),
    ("timezone_offset", "i"), // seconds from UTC
    ("is_dst_info_included", "?"),
    ("dst_adjustment", "B"), // 15-minute increments
    ("dst_start", "I"),
    ("dst_end", "I"),
]);

schema!(
    /// The supported-baudrate list returned during T001 negotiation.
    pub BAUD_LIST, "BaudList", [("baudrates", "{I}")]
);

// ---- Map memory transfer ----

schema!(pub MEM_PROPERTIES, "MemProperties", [
    ("mem_region", "H"), // flash region holding the supplementary map
    ("max_tiles", "H"),
    ("mem_size", "I"),
    ("unknown", "I"),
]);

schema!(
    /// Read request: region plus subfile name, empty for the whole region.
    pub MEM_FILE, "MemFile", [
        ("unknown", "I"),
        ("mem_region", "H"),
        ("subfile", "n"),
    ]
);

schema!(pub MEM_DATA, "MemData", [("length", "B"), ("data", "/0s")]);

schema!(pub MEM_RECORD, "MemRecord", [("index", "B"), ("chunk", "$")]);

schema!(pub MEM_CHUNK, "MemChunk", [("offset", "I"), ("chunk", "$")]);

schema!(pub MAP_PRODUCT, "MapProduct", [
    ("pid", "H"),
    ("fid", "H"),
    ("name", "n"),
]);

schema!(pub MAP_SEGMENT, "MapSegment", [
    ("pid", "H"),
    ("fid", "H"),
    ("segment_id", "I"),
    ("name", "n"),
    ("segment_name", "n"),
    ("area_name", "n"),
    ("segment_id2", "I"),
    ("end_token", "I"), // always 0x00000000
]);

schema!(pub MAP_UNKNOWN, "MapUnknown", [
    ("pid", "H"),
    ("fid", "H"),
    ("unknown1", "H"),
    ("unknown2", "I"),
]);

schema!(pub MAP_UNLOCK, "MapUnlock", [("unlock_code", "n")]);

schema!(pub MAP_SET, "MapSet", [("mapset_name", "n"), ("auto_name", "?")]);

schema!(
    /// One record of the MPS subfile: type byte, 16-bit length, content.
    pub MPS_RECORD, "MPSRecord", [
        ("type", "B"),
        ("length", "H"),
        ("content", "/1s"),
    ]
);

schema!(pub MPS_FILE, "MPSFile", [("records", "{B H /1s}")]);

// ---- Image and screenshot transfer ----

schema!(pub IMAGE_LIST, "ImageList", [("images", "{H ? B}")]);

schema!(pub IMAGE_NAME, "ImageName", [("name", "n")]);

schema!(pub IMAGE_INFORMATION_HEADER, "ImageInformationHeader", [
    ("unknown1", "B"),
    ("bpp", "B"),
    ("unknown2", "H"),
    ("height", "H"),
    ("width", "H"),
    ("bytewidth", "H"), // row width in bytes, including padding
    ("unknown3", "H"),
    ("color", "(B B B B)"), // transparent color, RGBA with unused alpha
]);

schema!(pub IMAGE_ID, "ImageId", [("id", "I")]);

schema!(pub IMAGE_COLOR_TABLE, "ImageColorTable", [
    ("id", "I"),
    ("colors", "{B B B B}"),
]);

schema!(pub IMAGE_CHUNK, "ImageChunk", [("id", "I"), ("chunk", "$")]);

schema!(pub SCREENSHOT_HEADER, "ScreenshotHeader", [
    ("section", "I"),
    ("offset", "I"),
    ("bytewidth", "I"),
    ("bpp", "I"),
    ("width", "I"),
    ("height", "I"),
    ("unknown2", "(12B)"),
]);

schema!(pub SCREENSHOT_COLOR, "ScreenshotColor", [
    ("section", "I"),
    ("offset", "I"),
    ("color", "(B B B)"), // blue, green, red
]);

schema!(pub SCREENSHOT_CHUNK, "ScreenshotChunk", [
    ("section", "I"),
    ("offset", "I"),
    ("chunk", "$"),
]);

/// Resolve a datatype tag from a capability array (the number after the
/// `D`) to its schema.
pub fn datatype_schema(tag: u16) -> Option<&'static Schema> {
    let schema: &'static Schema = match tag {
        100 => &D100,
        101 => &D101,
        102 => &D102,
        103 => &D103,
        104 => &D104,
        105 => &D105,
        106 => &D106,
        107 => &D107,
        108 => &D108,
        109 => &D109,
        110 => &D110,
        120 => &D120,
        150 => &D150,
        151 => &D151,
        152 => &D152,
        154 => &D154,
        155 => &D155,
        200 => &D200,
        201 => &D201,
        202 => &D202,
        210 => &D210,
        300 => &D300,
        301 => &D301,
        302 => &D302,
        303 => &D303,
        304 => &D304,
        310 => &D310,
        311 => &D311,
        312 => &D312,
        400 => &D400,
        403 => &D403,
        450 => &D450,
        500 => &D500,
        501 => &D501,
        550 => &D550,
        551 => &D551,
        600 => &D600,
        650 => &D650,
        700 => &D700,
        800 => &D800,
        906 => &D906,
        1000 => &D1000,
        1001 => &D1001,
        1002 => &D1002,
        1003 => &D1003,
        1004 => &D1004,
        1005 => &D1005,
        1006 => &D1006,
        1007 => &D1007,
        1008 => &D1008,
        1009 => &D1009,
        1010 => &D1010,
        1011 => &D1011,
        1012 => &D1012,
        1013 => &D1013,
        1015 => &D1015,
        1051 => &D1051,
        _ => return None,
    };
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cataloged_schema_compiles() {
        for tag in [
            100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 120, 150, 151, 152, 154,
            155, 200, 201, 202, 210, 300, 301, 302, 303, 304, 310, 311, 312, 400, 403, 450,
            500, 501, 550, 551, 600, 650, 700, 800, 906, 1000, 1001, 1002, 1003, 1004, 1005,
            1006, 1007, 1008, 1009, 1010, 1011, 1012, 1013, 1015, 1051,
        ] {
            let schema = datatype_schema(tag).unwrap();
            assert!(!schema.fields().is_empty(), "D{tag} has no fields");
        }
        assert!(datatype_schema(999).is_none());
    }

    #[test]
    fn d100_layout_is_58_bytes() {
        let data = [0u8; 58];
        let record = D100.unpack(&data).unwrap();
        assert_eq!(record.values().len(), 4);
        assert!(D100.unpack(&[0u8; 57]).is_err());
        assert!(D100.unpack(&[0u8; 59]).is_err());
    }

    #[test]
    fn d301_layout_is_21_bytes() {
        assert!(D301.unpack(&[0u8; 21]).is_ok());
    }

    #[test]
    fn d800_layout_is_64_bytes() {
        // 11 f32s and one i16 and one u32 and one f64 and two f64 position.
        let data = [0u8; 4 * 4 + 2 + 8 + 16 + 4 * 4 + 2 + 4];
        assert!(D800.unpack(&data).is_ok());
    }

    #[test]
    fn d600_reads_calendar_fields() {
        let data = [7u8, 14, 0xc6, 0x07, 16, 0, 33, 5];
        let record = D600.unpack(&data).unwrap();
        assert_eq!(record.get("year").unwrap().as_u16(), Some(1990));
        assert_eq!(record.get("month").unwrap().as_u8(), Some(7));
        assert_eq!(record.get("hour").unwrap().as_u16(), Some(16));
    }

    #[test]
    fn satellite_is_twelve_fixed_records() {
        let data = [0u8; 12 * 7];
        let record = SATELLITE.unpack(&data).unwrap();
        assert_eq!(record.get("records").unwrap().as_list().unwrap().len(), 12);
    }

    #[test]
    fn workout_slot_count_is_fixed() {
        // 4 + 20 * 32 + 16 + 1, each step being 32 bytes
        let data = [0u8; 661];
        let record = D1002.unpack(&data).unwrap();
        assert_eq!(record.get("steps").unwrap().as_list().unwrap().len(), 20);
    }

    #[test]
    fn product_data_ignores_additional_strings() {
        let mut data = Vec::new();
        data.extend_from_slice(&62u16.to_le_bytes());
        data.extend_from_slice(&210i16.to_le_bytes());
        data.extend_from_slice(b"GPS 38 Software Version 2.10\0");
        data.extend_from_slice(b"VERBMAP Americas Highway 1.00\0");
        let record = PRODUCT_DATA.unpack(&data).unwrap();
        assert_eq!(record.get("product_id").unwrap().as_u16(), Some(62));
        assert_eq!(record.get("software_version").unwrap().as_i16(), Some(210));
        assert_eq!(
            record.get("product_description").unwrap().as_bytes(),
            Some(&b"GPS 38 Software Version 2.10"[..])
        );
    }
}
