//! USB physical layer.
//!
//! Garmin devices expose one vendor-specific interface with a bulk OUT
//! endpoint for host-to-device traffic and an interrupt IN endpoint for
//! device-to-host traffic. USB transport is lossless, so the serial ACK/NAK
//! handshake does not exist here; bulk and interrupt endpoints preserve
//! message boundaries, so every read yields one whole packet.
//!
//! Packets travel in a 12-byte container:
//!
//! ```text
//! byte 0      layer (0 = USB protocol layer, 20 = application layer)
//! bytes 1-3   reserved, zero
//! bytes 4-5   packet id, little-endian
//! bytes 6-7   reserved, zero
//! bytes 8-11  data size, little-endian
//! bytes 12+   data
//! ```
//!
//! On GNU/Linux the `garmin_gps` kernel module claims these devices and must
//! be detached before the interface can be used.

use crate::error::{GarminError, LinkError, ProtocolError};
use crate::packet::Packet;
use bytes::Bytes;
use nusb::io::{EndpointRead, EndpointWrite};
use nusb::transfer::{Bulk, Interrupt};
use nusb::Interface;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, trace};

/// Garmin's USB vendor id.
pub const VENDOR_ID: u16 = 0x091e;

/// The configuration every known device uses.
pub const CONFIGURATION_VALUE: u8 = 1;

/// Largest packet a device will send.
pub const MAX_BUFFER_SIZE: usize = 4096;

const INTERFACE: u8 = 0;
const ENDPOINT_BULK_OUT: u8 = 0x02;
const ENDPOINT_INTERRUPT_IN: u8 = 0x81;

/// Session-control packets use this layer byte.
pub const LAYER_USB: u8 = 0;
/// All protocol traffic uses this layer byte.
pub const LAYER_APPLICATION: u8 = 20;

/// USB-protocol-layer packet ids.
pub const PID_START_SESSION: u16 = 5;
pub const PID_SESSION_STARTED: u16 = 6;

const HEADER_SIZE: usize = 12;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Build the 12-byte container around a payload.
pub fn pack(layer: u8, pid: u16, data: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_SIZE + data.len());
    packet.push(layer);
    packet.extend_from_slice(&[0; 3]);
    packet.extend_from_slice(&pid.to_le_bytes());
    packet.extend_from_slice(&[0; 2]);
    packet.extend_from_slice(&(data.len() as u32).to_le_bytes());
    packet.extend_from_slice(data);
    packet
}

/// Split a received container into its layer byte and packet.
pub fn unpack(buffer: &[u8]) -> Result<(u8, Packet), GarminError> {
    if buffer.len() < HEADER_SIZE {
        return Err(LinkError::Framing("packet too short").into());
    }
    let layer = buffer[0];
    let pid = u16::from_le_bytes([buffer[4], buffer[5]]);
    let size = u32::from_le_bytes([buffer[8], buffer[9], buffer[10], buffer[11]]) as usize;
    let data = &buffer[HEADER_SIZE..];
    if size != data.len() {
        return Err(ProtocolError::SizeMismatch.into());
    }
    Ok((layer, Packet::new(pid, data.to_vec())))
}

/// USB physical layer over one claimed interface.
pub struct UsbPhysical {
    #[allow(dead_code)]
    interface: Interface,
    reader: EndpointRead<Interrupt>,
    writer: EndpointWrite<Bulk>,
    timeout: Duration,
    max_retries: u32,
}

impl UsbPhysical {
    /// Find the first Garmin device, claim its interface, and perform the
    /// start-session handshake.
    pub async fn open() -> Result<Self, GarminError> {
        info!("Searching for Garmin USB device...");
        let device_info = nusb::list_devices()
            .await
            .map_err(LinkError::Usb)?
            .find(|d| d.vendor_id() == VENDOR_ID)
            .ok_or(LinkError::DeviceNotFound)?;
        info!(
            "Found device on bus {} addr {}",
            device_info.bus_id(),
            device_info.device_address()
        );
        let device = device_info.open().await.map_err(LinkError::Usb)?;

        // The garmin_gps kernel module binds the interface on Linux.
        if let Err(e) = device.detach_kernel_driver(INTERFACE) {
            trace!("Could not detach kernel driver: {e}");
        }

        // Selecting the already-active configuration is a no-op; some
        // platforms reject the request entirely, which is fine too.
        if let Err(e) = device.set_configuration(CONFIGURATION_VALUE).await {
            debug!("set_configuration failed: {e}");
        }

        let interface = device.claim_interface(INTERFACE).await.map_err(LinkError::Usb)?;
        info!("Interface {INTERFACE} claimed successfully");

        let ep_in = interface
            .endpoint::<Interrupt, _>(ENDPOINT_INTERRUPT_IN)
            .map_err(|e| LinkError::Io(std::io::Error::other(e)))?;
        let ep_out = interface
            .endpoint::<Bulk, _>(ENDPOINT_BULK_OUT)
            .map_err(|e| LinkError::Io(std::io::Error::other(e)))?;
        let reader = ep_in.reader(MAX_BUFFER_SIZE).with_num_transfers(4);
        let writer = ep_out.writer(MAX_BUFFER_SIZE).with_num_transfers(4);

        let mut usb = UsbPhysical {
            interface,
            reader,
            writer,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        };
        usb.start_session().await?;
        Ok(usb)
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Begin transferring packets.
    ///
    /// The Start Session packet must be sent before any other traffic, and
    /// again whenever the host deliberately stops transferring packets and
    /// wants to resume. The device answers with Session Started carrying its
    /// unit id (retrieved elsewhere, ignored here); anything received before
    /// that packet must be discarded.
    pub async fn start_session(&mut self) -> Result<(), GarminError> {
        info!("Start USB session");
        let buffer = pack(LAYER_USB, PID_START_SESSION, &[]);
        self.write(&buffer).await?;
        loop {
            let (layer, packet) = self.read_raw().await?;
            if layer == LAYER_USB && packet.id == PID_SESSION_STARTED {
                info!("Received Session Started packet");
                return Ok(());
            }
            debug!("Discarding packet {} received before session start", packet.id);
        }
    }

    async fn write(&mut self, buffer: &[u8]) -> Result<(), LinkError> {
        trace!("< {:02x?}", buffer);
        timeout(self.timeout, self.writer.write_all(buffer)).await??;
        timeout(self.timeout, self.writer.flush_end_async()).await??;
        Ok(())
    }

    async fn read_raw(&mut self) -> Result<(u8, Packet), GarminError> {
        let mut buffer = vec![0u8; MAX_BUFFER_SIZE];
        let read = timeout(self.timeout, self.reader.read(&mut buffer))
            .await
            .map_err(LinkError::from)?
            .map_err(LinkError::Io)?;
        buffer.truncate(read);
        trace!("> {:02x?}", buffer);
        unpack(&buffer)
    }

    /// Read one application packet, retrying transient USB errors within
    /// the budget.
    pub async fn read_packet(&mut self) -> Result<Packet, GarminError> {
        let mut retries = 0;
        loop {
            match self.read_raw().await {
                Ok((_, packet)) => return Ok(packet),
                Err(GarminError::Link(e)) => {
                    info!("{e}");
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(LinkError::RetriesExceeded.into());
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send one application packet, retrying transient USB errors within
    /// the budget.
    pub async fn send_packet(&mut self, pid: u16, data: Bytes) -> Result<(), GarminError> {
        let buffer = pack(LAYER_APPLICATION, pid, &data);
        let mut retries = 0;
        loop {
            match self.write(&buffer).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    info!("{e}");
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(LinkError::RetriesExceeded.into());
                    }
                }
            }
        }
    }
}
