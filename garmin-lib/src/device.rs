//! The device session facade.
//!
//! A [`Garmin`] owns one physical transport exclusively for the life of the
//! session. Opening it runs the bootstrap: A000 product data, then the A001
//! capability array (or the fallback table for devices that never send
//! one), then the registry that binds every negotiated protocol to its
//! datatype schemas. Everything negotiated is cached for the session and
//! only invalidated by dropping the device.

use crate::capability::{lookup_capabilities, parse_protocol_array, Capability};
use crate::command::{Command, CommandProtocol};
use crate::datatype::PRODUCT_DATA;
use crate::error::{GarminError, ProtocolError};
use crate::image::{self, Bitmap, ImageSlot, ImageType};
use crate::link::{Link, Pid};
use crate::map::{self, MemoryProperties, MpsEntry};
use crate::physical::PhysicalLayer;
use crate::pvt::PvtStream;
use crate::registry::{ProtocolRegistry, ProtocolRole};
use crate::schema::Record;
use crate::semantic::ProductData;
use crate::serial::SerialPhysical;
use crate::transfer::{bulk_binding, reborrow_progress, single_binding, Progress, Transfer};
use crate::usb::UsbPhysical;
use bytes::Bytes;
use tracing::{info, warn};

/// Runs, with their chained laps and track logs.
#[derive(Debug, Default)]
pub struct Runs {
    pub runs: Vec<Record>,
    pub laps: Vec<Record>,
    pub tracks: Vec<Record>,
}

/// Workouts, with their chained occurrences.
#[derive(Debug, Default)]
pub struct Workouts {
    pub workouts: Vec<Record>,
    pub occurrences: Vec<Record>,
}

/// Courses, with their chained laps, tracks, and points.
#[derive(Debug, Default)]
pub struct Courses {
    pub courses: Vec<Record>,
    pub laps: Vec<Record>,
    pub tracks: Vec<Record>,
    pub points: Vec<Record>,
}

/// An open session with one device.
pub struct Garmin {
    link: Link,
    product: ProductData,
    capabilities: Vec<Capability>,
    registry: ProtocolRegistry,
    commands: Option<CommandProtocol>,
    unit_id: Option<u32>,
    memory: Option<MemoryProperties>,
}

impl std::fmt::Debug for Garmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Garmin")
            .field("product", &self.product)
            .field("capabilities", &self.capabilities)
            .field("commands", &self.commands)
            .field("unit_id", &self.unit_id)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

impl Garmin {
    /// Open a session over a serial port (e.g. `/dev/ttyUSB0` or `COM1`).
    pub async fn open_serial(port: &str) -> Result<Garmin, GarminError> {
        Garmin::from_physical(PhysicalLayer::Serial(SerialPhysical::open(port)?)).await
    }

    /// Open a session over USB, talking to the first Garmin device found.
    pub async fn open_usb() -> Result<Garmin, GarminError> {
        Garmin::from_physical(PhysicalLayer::Usb(UsbPhysical::open().await?)).await
    }

    /// Run the session bootstrap over an already-open transport.
    pub async fn from_physical(phys: PhysicalLayer) -> Result<Garmin, GarminError> {
        let mut link = Link::new(phys);

        info!("Request product data...");
        link.send_packet(Pid::ProductRqst, Bytes::new()).await?;
        let packet = link.expect_packet(Pid::ProductData).await?;
        let record = PRODUCT_DATA.unpack(&packet.data)?;
        let product = ProductData::from_record(&record).ok_or(ProtocolError::Schema {
            schema: "ProductData",
            message: "missing field".into(),
        })?;
        info!("Product ID: {}", product.product_id);
        info!("Software version: {:.2}", product.software_version);
        info!("Product description: {}", product.product_description);

        // A001: a capable device sends its protocol array unprompted after
        // the product data. A read timeout means the device predates the
        // protocol and the fallback table decides.
        let capabilities = match link.expect_packet(Pid::ProtocolArray).await {
            Ok(packet) => parse_protocol_array(&packet.data)?,
            Err(GarminError::Link(e)) => {
                info!("Protocol Capability Protocol not supported by the device ({e})");
                lookup_capabilities(product.product_id, product.software_version)
                    .ok_or(ProtocolError::UnknownProduct(product.product_id))?
            }
            Err(e) => return Err(e),
        };

        let registry = ProtocolRegistry::build(&capabilities);
        link.protocol = registry.link_protocol();
        let commands = registry.command_protocol();

        Ok(Garmin {
            link,
            product,
            capabilities,
            registry,
            commands,
            unit_id: None,
            memory: None,
        })
    }

    pub fn product_data(&self) -> &ProductData {
        &self.product
    }

    /// The negotiated capability set, as reported or looked up.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    fn transfer(&mut self) -> Result<Transfer<'_>, GarminError> {
        let commands = self
            .commands
            .ok_or(ProtocolError::Unsupported("device_command_protocol"))?;
        Ok(Transfer::new(&mut self.link, commands))
    }

    /// Run the bulk download bound to a role.
    async fn download_role(
        &mut self,
        role: ProtocolRole,
        progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        let binding = self.registry.require(role)?;
        let (command, pids) = bulk_binding(binding.protocol.kind, binding.protocol.number)
            .ok_or(ProtocolError::Unsupported(role.name()))?;
        let datatypes = binding.datatypes.clone();
        let mut transfer = self.transfer()?;
        transfer.download(command, pids, &datatypes, progress).await
    }

    /// Run the chained part of a download; a missing dependent protocol is
    /// skipped with a warning instead of failing the primary transfer.
    async fn download_chained(
        &mut self,
        role: ProtocolRole,
        progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        if self.registry.get(role).is_none() {
            warn!("Protocol {} is not supported. Skipping...", role.name());
            return Ok(Vec::new());
        }
        self.download_role(role, progress).await
    }

    /// Run the bulk upload bound to a role. Each record's pid is derived
    /// from the position of its schema in the negotiated datatype list.
    async fn upload_role(
        &mut self,
        role: ProtocolRole,
        records: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        let binding = self.registry.require(role)?;
        let (command, pids) = bulk_binding(binding.protocol.kind, binding.protocol.number)
            .ok_or(ProtocolError::Unsupported(role.name()))?;
        let datatypes = binding.datatypes.clone();
        let mut packets = Vec::with_capacity(records.len());
        for record in records {
            let position = datatypes
                .iter()
                .position(|schema| std::ptr::eq(*schema, record.schema()))
                .ok_or_else(|| ProtocolError::Schema {
                    schema: record.schema_name(),
                    message: format!("not a negotiated datatype of {}", role.name()),
                })?;
            let pid = *pids.get(position).ok_or(ProtocolError::Schema {
                schema: record.schema_name(),
                message: "no pid for datatype position".into(),
            })?;
            packets.push((pid, record));
        }
        let mut transfer = self.transfer()?;
        transfer.upload(command, &packets, progress).await
    }

    /// Run the single-record exchange bound to a role.
    async fn single_role(&mut self, role: ProtocolRole) -> Result<Record, GarminError> {
        let binding = self.registry.require(role)?;
        let (command, pid) = single_binding(binding.protocol.kind, binding.protocol.number)
            .ok_or(ProtocolError::Unsupported(role.name()))?;
        let schema = *binding.datatypes.first().ok_or(ProtocolError::Schema {
            schema: "registry",
            message: format!("{} has no datatype", role.name()),
        })?;
        let mut transfer = self.transfer()?;
        transfer.single(command, pid, schema).await
    }

    /// Download waypoints.
    pub async fn get_waypoints(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::WaypointTransfer, progress).await
    }

    /// Upload waypoints built against the negotiated waypoint datatype.
    pub async fn put_waypoints(
        &mut self,
        waypoints: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        self.upload_role(ProtocolRole::WaypointTransfer, waypoints, progress).await
    }

    /// Download waypoint categories.
    pub async fn get_waypoint_categories(
        &mut self,
        progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::WaypointCategoryTransfer, progress).await
    }

    /// Upload waypoint categories. Only pre-built records are accepted.
    pub async fn put_waypoint_categories(
        &mut self,
        categories: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        self.upload_role(ProtocolRole::WaypointCategoryTransfer, categories, progress).await
    }

    /// Download routes: headers, waypoints, and (A201) links, in device
    /// order.
    pub async fn get_routes(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::RouteTransfer, progress).await
    }

    /// Upload routes as pre-built records in caller order (header, then its
    /// waypoints, with links between them on A201).
    pub async fn put_routes(
        &mut self,
        routes: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        self.upload_role(ProtocolRole::RouteTransfer, routes, progress).await
    }

    /// Download the track log.
    pub async fn get_tracks(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::TrackLogTransfer, progress).await
    }

    /// Upload track logs (not available on A302 devices, which are
    /// download-only; the device ignores the attempt).
    pub async fn put_tracks(
        &mut self,
        tracks: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        self.upload_role(ProtocolRole::TrackLogTransfer, tracks, progress).await
    }

    /// Download proximity waypoints.
    pub async fn get_proximities(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::ProximityWaypointTransfer, progress).await
    }

    /// Upload proximity waypoints.
    pub async fn put_proximities(
        &mut self,
        waypoints: Vec<Record>,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        self.upload_role(ProtocolRole::ProximityWaypointTransfer, waypoints, progress).await
    }

    /// Download the almanac.
    pub async fn get_almanac(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::AlmanacTransfer, progress).await
    }

    /// Download flightbook records.
    pub async fn get_flightbook(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::FlightbookTransfer, progress).await
    }

    /// Read the device's current date and time.
    pub async fn get_time(&mut self) -> Result<Record, GarminError> {
        self.single_role(ProtocolRole::DateAndTimeInitialization).await
    }

    /// Read the device's current position.
    pub async fn get_position(&mut self) -> Result<Record, GarminError> {
        self.single_role(ProtocolRole::PositionInitialization).await
    }

    /// Turn on PVT mode; the device then transmits roughly once per second.
    pub async fn pvt_on(&mut self) -> Result<(), GarminError> {
        info!("Start transmitting PVT data");
        self.registry.require(ProtocolRole::Pvt)?;
        let mut transfer = self.transfer()?;
        transfer.send_command(Command::StartPvtData).await
    }

    /// Turn off PVT mode. The stream is drained cooperatively: keep calling
    /// [`Garmin::get_pvt`] until it times out.
    pub async fn pvt_off(&mut self) -> Result<(), GarminError> {
        info!("Stop transmitting PVT data");
        let mut transfer = self.transfer()?;
        transfer.send_command(Command::StopPvtData).await
    }

    /// Block until the next PVT (or interleaved satellite) packet.
    pub async fn get_pvt(&mut self) -> Result<Record, GarminError> {
        let binding = self.registry.require(ProtocolRole::Pvt)?;
        let datatype = *binding.datatypes.first().ok_or(ProtocolError::Schema {
            schema: "registry",
            message: "pvt_protocol has no datatype".into(),
        })?;
        let transfer = self.transfer()?;
        PvtStream::new(transfer, datatype).next().await
    }

    /// Download laps.
    pub async fn get_laps(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::LapTransfer, progress).await
    }

    /// Download runs with their chained laps and track logs.
    pub async fn get_runs(&mut self, mut progress: Progress<'_>) -> Result<Runs, GarminError> {
        let runs = self.download_role(ProtocolRole::RunTransfer, reborrow_progress(&mut progress)).await?;
        let laps = self
            .download_chained(ProtocolRole::LapTransfer, reborrow_progress(&mut progress))
            .await?;
        let tracks = self
            .download_chained(ProtocolRole::TrackLogTransfer, progress)
            .await?;
        Ok(Runs { runs, laps, tracks })
    }

    /// Download workouts with their chained occurrences.
    pub async fn get_workouts(&mut self, mut progress: Progress<'_>) -> Result<Workouts, GarminError> {
        let workouts = self
            .download_role(ProtocolRole::WorkoutTransfer, reborrow_progress(&mut progress))
            .await?;
        let occurrences = self
            .download_chained(ProtocolRole::WorkoutOccurrenceTransfer, progress)
            .await?;
        Ok(Workouts { workouts, occurrences })
    }

    /// Download workout occurrences alone.
    pub async fn get_workout_occurrences(
        &mut self,
        progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::WorkoutOccurrenceTransfer, progress).await
    }

    /// Read the fitness user profile.
    pub async fn get_fitness_user_profile(&mut self) -> Result<Record, GarminError> {
        self.single_role(ProtocolRole::FitnessUserProfileTransfer).await
    }

    /// Read the workout limits.
    pub async fn get_workout_limits(&mut self) -> Result<Record, GarminError> {
        self.single_role(ProtocolRole::WorkoutLimitsTransfer).await
    }

    /// Download courses with their chained laps, tracks, and points.
    ///
    /// Course tracks use A1012 when the device reports it; otherwise the
    /// generic track datatypes negotiated for the track log are applied to
    /// the course-track pids.
    pub async fn get_courses(&mut self, mut progress: Progress<'_>) -> Result<Courses, GarminError> {
        let courses = self
            .download_role(ProtocolRole::CourseTransfer, reborrow_progress(&mut progress))
            .await?;
        let laps = self
            .download_chained(ProtocolRole::CourseLapTransfer, reborrow_progress(&mut progress))
            .await?;
        let tracks = if self.registry.get(ProtocolRole::CourseTrackTransfer).is_some() {
            self.download_role(ProtocolRole::CourseTrackTransfer, reborrow_progress(&mut progress))
                .await?
        } else {
            let track_binding = self.registry.require(ProtocolRole::TrackLogTransfer)?;
            let datatypes = track_binding.datatypes.clone();
            let mut transfer = self.transfer()?;
            transfer
                .download(
                    Command::TransferCourseTracks,
                    &[Pid::CourseTrkHdr, Pid::CourseTrkData],
                    &datatypes,
                    reborrow_progress(&mut progress),
                )
                .await?
        };
        let points = self
            .download_chained(ProtocolRole::CoursePointTransfer, progress)
            .await?;
        Ok(Courses { courses, laps, tracks, points })
    }

    /// Download course laps alone.
    pub async fn get_course_laps(&mut self, progress: Progress<'_>) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::CourseLapTransfer, progress).await
    }

    /// Download course points alone.
    pub async fn get_course_points(
        &mut self,
        progress: Progress<'_>,
    ) -> Result<Vec<Record>, GarminError> {
        self.download_role(ProtocolRole::CoursePointTransfer, progress).await
    }

    /// Read the course limits.
    pub async fn get_course_limits(&mut self) -> Result<Record, GarminError> {
        self.single_role(ProtocolRole::CourseLimitsTransfer).await
    }

    /// The device's unit id, an undocumented identity separate from the
    /// product id. Cached for the session.
    pub async fn unit_id(&mut self) -> Result<u32, GarminError> {
        if let Some(id) = self.unit_id {
            return Ok(id);
        }
        info!("Request unit ID...");
        let mut transfer = self.transfer()?;
        transfer.send_command(Command::TransferUnitId).await?;
        let packet = transfer.link.expect_packet(Pid::UnitId).await?;
        let id = packet.as_uint().ok_or(ProtocolError::SizeMismatch)? as u32;
        self.unit_id = Some(id);
        Ok(id)
    }

    /// The device's map memory properties. Cached for the session.
    pub async fn get_memory_properties(&mut self) -> Result<MemoryProperties, GarminError> {
        if let Some(properties) = self.memory {
            return Ok(properties);
        }
        self.registry.require(ProtocolRole::MapTransfer)?;
        let mut transfer = self.transfer()?;
        let properties = map::memory_properties(&mut transfer).await?;
        self.memory = Some(properties);
        Ok(properties)
    }

    /// Read the map descriptions stored on the device.
    pub async fn get_map_properties(&mut self) -> Result<Option<Vec<MpsEntry>>, GarminError> {
        let region = self.get_memory_properties().await?.mem_region;
        let mut transfer = self.transfer()?;
        map::map_properties(&mut transfer, region).await
    }

    /// Download the map as raw Garmin IMG data.
    pub async fn get_map(&mut self, progress: Progress<'_>) -> Result<Option<Vec<u8>>, GarminError> {
        info!("Download map...");
        let region = self.get_memory_properties().await?.mem_region;
        let mut transfer = self.transfer()?;
        map::read_memory(&mut transfer, region, "", progress).await
    }

    /// Delete the map from the device.
    pub async fn del_map(&mut self) -> Result<(), GarminError> {
        let region = self.get_memory_properties().await?.mem_region;
        let mut transfer = self.transfer()?;
        map::write_memory(&mut transfer, region, None, None).await
    }

    /// Upload a map in Garmin IMG format (multiple IMG files merged into
    /// one `gmapsupp.img`). A locked map needs its unlock key.
    ///
    /// On serial links with T001 support the baud rate is raised for the
    /// write and restored afterwards.
    pub async fn put_map(
        &mut self,
        data: &[u8],
        key: Option<&[u8]>,
        mut progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        let properties = self.get_memory_properties().await?;
        info!("Map size: {} bytes", data.len());
        if data.len() as u64 > u64::from(properties.mem_size) {
            return Err(ProtocolError::Invalid("insufficient memory to upload map".into()).into());
        }
        if let Some(key) = key {
            let mut transfer = self.transfer()?;
            map::send_unlock_key(&mut transfer, key).await?;
        }

        let negotiate_baud = self.link.physical().is_serial()
            && self.registry.get(ProtocolRole::Transmission).is_some();
        let original_baudrate = self.link.physical().baudrate();
        if negotiate_baud {
            let mut transfer = self.transfer()?;
            let rates = map::supported_baudrates(&mut transfer).await?;
            if let Some(&fastest) = rates.first() {
                map::set_baudrate(&mut transfer, fastest).await?;
            }
        }

        let result = {
            let mut transfer = self.transfer()?;
            map::write_memory(&mut transfer, properties.mem_region, Some(data), reborrow_progress(&mut progress))
                .await
        };

        if negotiate_baud {
            if let Some(baudrate) = original_baudrate {
                let mut transfer = self.transfer()?;
                map::set_baudrate(&mut transfer, baudrate).await?;
            }
        }
        result
    }

    /// Capture the device's display.
    pub async fn get_screenshot(&mut self, progress: Progress<'_>) -> Result<Bitmap, GarminError> {
        let mut transfer = self.transfer()?;
        image::get_screenshot(&mut transfer, progress).await
    }

    /// The image types (categories of image slots) the device exposes.
    pub async fn get_image_types(&mut self) -> Result<Vec<ImageType>, GarminError> {
        let mut transfer = self.transfer()?;
        image::get_image_types(&mut transfer).await
    }

    /// The image slots the device exposes.
    pub async fn get_image_list(&mut self) -> Result<Vec<ImageSlot>, GarminError> {
        let mut transfer = self.transfer()?;
        image::get_image_list(&mut transfer).await
    }

    /// Download one image slot.
    pub async fn get_image(&mut self, idx: u16, progress: Progress<'_>) -> Result<Bitmap, GarminError> {
        let mut transfer = self.transfer()?;
        image::get_image(&mut transfer, idx, progress).await
    }

    /// Upload a bitmap into a writable image slot.
    pub async fn put_image(
        &mut self,
        idx: u16,
        bitmap: &Bitmap,
        progress: Progress<'_>,
    ) -> Result<(), GarminError> {
        let mut transfer = self.transfer()?;
        image::put_image(&mut transfer, idx, bitmap, progress).await
    }

    /// Abort the transfer in progress.
    pub async fn abort_transfer(&mut self) -> Result<(), GarminError> {
        info!("Abort transfer");
        let mut transfer = self.transfer()?;
        transfer.send_command(Command::AbortTransfer).await
    }

    /// Turn the device off.
    pub async fn turn_power_off(&mut self) -> Result<(), GarminError> {
        info!("Turn power off");
        let mut transfer = self.transfer()?;
        transfer.send_command(Command::TurnOffPwr).await
    }
}
