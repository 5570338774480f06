//! Physical layer dispatch.
//!
//! A session owns exactly one transport. The two real transports have
//! different acknowledgement disciplines (serial ACK/NAK versus lossless
//! USB), which is hidden behind [`PhysicalLayer::read_packet`] and
//! [`PhysicalLayer::send_packet`].

use crate::error::GarminError;
use crate::packet::Packet;
use crate::serial::SerialPhysical;
use crate::usb::UsbPhysical;
use bytes::Bytes;
use std::time::Duration;

pub enum PhysicalLayer {
    Serial(SerialPhysical),
    Usb(UsbPhysical),
    #[cfg(test)]
    Mock(MockPhysical),
}

impl PhysicalLayer {
    /// Read the next packet from the device.
    pub async fn read_packet(&mut self) -> Result<Packet, GarminError> {
        match self {
            PhysicalLayer::Serial(serial) => serial.read_packet(true).await,
            PhysicalLayer::Usb(usb) => usb.read_packet().await,
            #[cfg(test)]
            PhysicalLayer::Mock(mock) => mock.read_packet(),
        }
    }

    /// Send one packet to the device, waiting for the acknowledgement on
    /// transports that have one.
    pub async fn send_packet(&mut self, pid: u16, data: Bytes) -> Result<(), GarminError> {
        match self {
            PhysicalLayer::Serial(serial) => serial.send_packet(pid, data, true).await,
            PhysicalLayer::Usb(usb) => usb.send_packet(pid, data).await,
            #[cfg(test)]
            PhysicalLayer::Mock(mock) => mock.send_packet(pid, data),
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, PhysicalLayer::Serial(_))
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        match self {
            PhysicalLayer::Serial(serial) => serial.set_timeout(timeout),
            PhysicalLayer::Usb(usb) => usb.set_timeout(timeout),
            #[cfg(test)]
            PhysicalLayer::Mock(_) => {}
        }
    }

    /// Current baud rate; meaningful only on serial links.
    pub fn baudrate(&self) -> Option<u32> {
        match self {
            PhysicalLayer::Serial(serial) => Some(serial.baudrate()),
            PhysicalLayer::Usb(_) => None,
            #[cfg(test)]
            PhysicalLayer::Mock(mock) => Some(mock.baudrate),
        }
    }

    /// Change the baud rate; no-op on transports without one.
    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<(), GarminError> {
        match self {
            PhysicalLayer::Serial(serial) => serial.set_baudrate(baudrate),
            PhysicalLayer::Usb(_) => Ok(()),
            #[cfg(test)]
            PhysicalLayer::Mock(mock) => {
                mock.baudrate = baudrate;
                Ok(())
            }
        }
    }
}

/// Scripted transport for protocol-level tests: reads pop from a queue of
/// device-to-host packets, sends are recorded for inspection. An exhausted
/// queue reads as a timeout, which is also how an unsupported command
/// manifests on real hardware.
#[cfg(test)]
pub struct MockPhysical {
    pub incoming: std::collections::VecDeque<Packet>,
    pub sent: Vec<Packet>,
    pub baudrate: u32,
}

#[cfg(test)]
impl MockPhysical {
    pub fn new(incoming: impl IntoIterator<Item = Packet>) -> Self {
        MockPhysical {
            incoming: incoming.into_iter().collect(),
            sent: Vec::new(),
            baudrate: crate::serial::DEFAULT_BAUDRATE,
        }
    }

    fn read_packet(&mut self) -> Result<Packet, GarminError> {
        self.incoming
            .pop_front()
            .ok_or_else(|| crate::error::LinkError::Timeout.into())
    }

    fn send_packet(&mut self, pid: u16, data: Bytes) -> Result<(), GarminError> {
        self.sent.push(Packet { id: pid, data });
        Ok(())
    }
}
