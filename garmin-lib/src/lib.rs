//! Host-side implementation of the Garmin Device Interface protocol stack.
//!
//! The stack talks to Garmin GPS handhelds and fitness devices over serial
//! (DLE/ETX framing with ACK/NAK) or USB bulk transport, negotiates what
//! the connected device can do, and moves typed records: waypoints, routes,
//! tracks, laps, runs, courses, almanac data, real-time PVT, map images,
//! and screenshots.
//!
//! ```no_run
//! use garmin_lib::Garmin;
//!
//! # async fn example() -> Result<(), garmin_lib::GarminError> {
//! let mut gps = Garmin::open_usb().await?;
//! println!("{:?}", gps.product_data());
//! let waypoints = gps.get_waypoints(None).await?;
//! for waypoint in &waypoints {
//!     println!("{:?}", garmin_lib::semantic::WaypointView::from_record(waypoint));
//! }
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod command;
pub mod datatype;
pub mod device;
pub mod error;
pub mod image;
pub mod link;
pub mod map;
pub mod packet;
pub mod physical;
pub mod pvt;
pub mod registry;
pub mod schema;
pub mod semantic;
pub mod serial;
pub mod symbol;
pub mod transfer;
pub mod usb;

// Re-export commonly used types
pub use capability::{Capability, ProtocolId};
pub use command::{Command, CommandProtocol};
pub use device::{Courses, Garmin, Runs, Workouts};
pub use error::{GarminError, LinkError, ProtocolError};
pub use image::{Bitmap, ImageSlot, ImageType};
pub use link::{Link, LinkProtocol, Pid};
pub use map::{MemoryProperties, MpsEntry};
pub use packet::Packet;
pub use physical::PhysicalLayer;
pub use pvt::PvtStream;
pub use registry::{ProtocolBinding, ProtocolRegistry, ProtocolRole};
pub use schema::{Record, Schema, Value};
pub use semantic::{
    CoursePointView, FlightbookView, LapView, ProductData, PvtView, RunView, TrackPointView,
    WaypointView,
};
