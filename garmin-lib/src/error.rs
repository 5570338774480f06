use std::io;
use thiserror::Error;

/// Transport-level errors.
///
/// Everything in here is potentially transient: the physical layers retry
/// these within their configured budget and only surface them once the
/// budget is exhausted.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Garmin device not found")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("read timed out")]
    Timeout,

    #[error("invalid packet: {0}")]
    Framing(&'static str),

    #[error("invalid packet: checksum failed")]
    Checksum,

    #[error("peer sent NAK: packet was not received correctly")]
    Nak,

    #[error("maximum retries exceeded")]
    RetriesExceeded,
}

impl From<tokio::time::error::Elapsed> for LinkError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        LinkError::Timeout
    }
}

/// Higher-layer protocol errors. These are never retried.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("serial link doesn't support packet ids higher than 255")]
    PidOutOfRange(u16),

    #[error("expected packet id {expected}, got {got}")]
    UnexpectedPid { expected: u16, got: u16 },

    #[error("expected one of packet ids {expected:?}, got {got}")]
    UnexpectedPidOneOf { expected: Vec<u16>, got: u16 },

    #[error("device acknowledged packet id {got}, expected {expected}")]
    AckMismatch { expected: u16, got: u16 },

    #[error("unknown product id {0} and the device did not report its capabilities")]
    UnknownProduct(u16),

    #[error("protocol {0} is not supported by the device")]
    Unsupported(&'static str),

    #[error("packet id {0:?} is not defined by the negotiated link protocol")]
    UnsupportedPid(crate::link::Pid),

    #[error("command {0:?} is not supported by the device command protocol")]
    UnsupportedCommand(crate::command::Command),

    #[error("schema error in {schema}: {message}")]
    Schema { schema: &'static str, message: String },

    #[error("invalid packet: wrong size of packet data")]
    SizeMismatch,

    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    #[error("unsupported color depth {0} bpp")]
    UnsupportedColorDepth(u32),

    #[error("invalid image index {0}")]
    InvalidImageIndex(u16),

    #[error("image id mismatch: expected {expected}, got {got}")]
    ImageIdMismatch { expected: u32, got: u32 },

    #[error("invalid section: expected {expected}, got {got}")]
    UnexpectedSection { expected: &'static str, got: &'static str },

    #[error("{0}")]
    Invalid(String),
}

/// The error type surfaced by the public API.
///
/// Invariant violations that leave the session state unknown (for example a
/// reply that is neither ACK nor NAK) use the `Session` variant; callers
/// should drop the session rather than retry.
#[derive(Error, Debug)]
pub enum GarminError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("session error: {0}")]
    Session(&'static str),
}

impl From<nusb::Error> for GarminError {
    fn from(e: nusb::Error) -> Self {
        GarminError::Link(LinkError::Usb(e))
    }
}

impl From<io::Error> for GarminError {
    fn from(e: io::Error) -> Self {
        GarminError::Link(LinkError::Io(e))
    }
}
