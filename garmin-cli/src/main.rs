//! Command-line front-end for garmin-lib.
//!
//! Downloads are printed as JSON lines on stdout so they can be piped into
//! format converters; logging goes to stderr and is controlled with
//! `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use garmin_lib::semantic::{
    datetime_from_d600, CoursePointView, FlightbookView, LapView, PvtView, RadianPosition,
    RunView, TrackPointView, WaypointView,
};
use garmin_lib::{Garmin, Record};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Talk to a Garmin GPS device over serial or USB.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port to use (e.g. /dev/ttyUSB0 or COM1); omit for USB.
    #[arg(short, long)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show product data and the negotiated capability set.
    Info,
    /// Show the device's unit id.
    UnitId,
    /// Download waypoints.
    Waypoints,
    /// Download routes.
    Routes,
    /// Download the track log.
    Tracks,
    /// Download proximity waypoints.
    Proximities,
    /// Download fitness laps.
    Laps,
    /// Download fitness runs with their laps and tracks.
    Runs,
    /// Download fitness courses with their laps, tracks, and points.
    Courses,
    /// Download workouts and their occurrences.
    Workouts,
    /// Download flightbook records.
    Flightbook,
    /// Download the almanac.
    Almanac,
    /// Read the device's date and time.
    Time,
    /// Read the device's position.
    Position,
    /// Stream real-time position/velocity/time packets.
    Pvt {
        /// Number of packets to read before stopping.
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
    /// Capture a screenshot; pixel rows are written raw to the output file.
    Screenshot {
        /// Output path for the raw pixel array.
        output: PathBuf,
    },
    /// Show the maps stored on the device.
    MapInfo,
    /// Download the map in Garmin IMG format.
    Map {
        /// Output path for the IMG data.
        output: PathBuf,
    },
    /// List the image slots available for download or replacement.
    ImageList,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("valid default filter");
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut gps = match &cli.port {
        Some(port) => Garmin::open_serial(port).await?,
        None => Garmin::open_usb().await?,
    };

    match cli.command {
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(gps.product_data())?);
            for capability in gps.capabilities() {
                let datatypes: Vec<String> = capability
                    .datatypes
                    .iter()
                    .map(|d| format!("D{d:03}"))
                    .collect();
                println!("{} {}", capability.protocol, datatypes.join(" "));
            }
        }
        Commands::UnitId => {
            println!("{}", gps.unit_id().await?);
        }
        Commands::Waypoints => {
            let records = gps.get_waypoints(Some(&mut progress)).await?;
            for record in &records {
                match WaypointView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
            }
        }
        Commands::Routes => {
            let records = gps.get_routes(Some(&mut progress)).await?;
            for record in &records {
                match WaypointView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("# {} {record:?}", record.schema_name()),
                }
            }
        }
        Commands::Tracks => {
            let records = gps.get_tracks(Some(&mut progress)).await?;
            print_track_records(&records)?;
        }
        Commands::Proximities => {
            let records = gps.get_proximities(Some(&mut progress)).await?;
            for record in &records {
                match WaypointView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
            }
        }
        Commands::Laps => {
            let records = gps.get_laps(Some(&mut progress)).await?;
            print_lap_records(&records)?;
        }
        Commands::Runs => {
            let runs = gps.get_runs(Some(&mut progress)).await?;
            for record in &runs.runs {
                match RunView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
            }
            print_lap_records(&runs.laps)?;
            print_track_records(&runs.tracks)?;
        }
        Commands::Courses => {
            let courses = gps.get_courses(Some(&mut progress)).await?;
            for record in &courses.courses {
                println!("{record:?}");
            }
            print_lap_records(&courses.laps)?;
            print_track_records(&courses.tracks)?;
            for record in &courses.points {
                match CoursePointView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
            }
        }
        Commands::Workouts => {
            let workouts = gps.get_workouts(Some(&mut progress)).await?;
            for record in workouts.workouts.iter().chain(&workouts.occurrences) {
                println!("{record:?}");
            }
        }
        Commands::Flightbook => {
            for record in &gps.get_flightbook(Some(&mut progress)).await? {
                match FlightbookView::from_record(record) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
            }
        }
        Commands::Almanac => {
            for record in &gps.get_almanac(Some(&mut progress)).await? {
                println!("{record:?}");
            }
        }
        Commands::Time => {
            let record = gps.get_time().await?;
            match datetime_from_d600(&record) {
                Some(datetime) => println!("{datetime}"),
                None => println!("{record:?}"),
            }
        }
        Commands::Position => {
            let record = gps.get_position().await?;
            let position = record
                .get("lat")
                .zip(record.get("lon"))
                .and_then(|(lat, lon)| Some((lat.as_f64()?, lon.as_f64()?)))
                .map(|(lat, lon)| RadianPosition { lat, lon }.to_degrees());
            match position {
                Some(degrees) => println!("{}", serde_json::to_string(&degrees)?),
                None => println!("{record:?}"),
            }
        }
        Commands::Pvt { count } => {
            let legacy =
                garmin_lib::semantic::is_legacy_product(&gps.product_data().product_description);
            gps.pvt_on().await?;
            let mut seen = 0;
            while seen < count {
                let record = gps.get_pvt().await?;
                if record.schema_name() == "Satellite" {
                    continue;
                }
                match PvtView::from_record(&record, legacy) {
                    Some(view) => println!("{}", serde_json::to_string(&view)?),
                    None => println!("{record:?}"),
                }
                seen += 1;
            }
            gps.pvt_off().await?;
            // Drain whatever was already in flight.
            while let Ok(record) = gps.get_pvt().await {
                drop(record);
            }
        }
        Commands::Screenshot { output } => {
            let bitmap = gps.get_screenshot(Some(&mut progress)).await?;
            eprintln!(
                "{}x{} pixels, {} bpp, {} palette entries",
                bitmap.width,
                bitmap.height,
                bitmap.bpp,
                bitmap.palette.len()
            );
            std::fs::write(&output, &bitmap.pixels)?;
            eprintln!("Raw pixel array written to {}", output.display());
        }
        Commands::MapInfo => {
            let properties = gps.get_memory_properties().await?;
            eprintln!(
                "region {} holds up to {} tiles, {} bytes",
                properties.mem_region, properties.max_tiles, properties.mem_size
            );
            match gps.get_map_properties().await? {
                Some(entries) => {
                    for entry in entries {
                        println!("{entry:?}");
                    }
                }
                None => eprintln!("no map description found"),
            }
        }
        Commands::Map { output } => match gps.get_map(Some(&mut progress)).await? {
            Some(data) => {
                std::fs::write(&output, &data)?;
                eprintln!("{} bytes written to {}", data.len(), output.display());
            }
            None => eprintln!("no map stored on the device"),
        },
        Commands::ImageList => {
            for image_type in gps.get_image_types().await? {
                println!("type {}: {}", image_type.idx, image_type.name);
            }
            for slot in gps.get_image_list().await? {
                println!(
                    "{} {} (type {}{})",
                    slot.idx,
                    slot.name,
                    slot.image_type,
                    if slot.writable { ", writable" } else { "" }
                );
            }
        }
    }
    Ok(())
}

fn print_lap_records(records: &[Record]) -> Result<(), Box<dyn std::error::Error>> {
    for record in records {
        match LapView::from_record(record) {
            Some(view) => println!("{}", serde_json::to_string(&view)?),
            None => println!("# {} {record:?}", record.schema_name()),
        }
    }
    Ok(())
}

fn print_track_records(records: &[Record]) -> Result<(), Box<dyn std::error::Error>> {
    for record in records {
        match TrackPointView::from_record(record) {
            Some(view) => println!("{}", serde_json::to_string(&view)?),
            None => println!("# {} {record:?}", record.schema_name()),
        }
    }
    Ok(())
}

fn progress(current: usize, total: usize) {
    if current == total || current % 25 == 0 {
        eprint!("\r{current}/{total}");
        if current == total {
            eprintln!();
        }
    }
}
