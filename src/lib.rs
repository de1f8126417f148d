//! A non-blocking bridge between a stepped caller, such as a clocked hardware
//! simulation, and a Linux TAP interface. Frames are exchanged one at a time
//! in each direction and no call ever sleeps.

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate byteorder;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate libc;
#[macro_use]
extern crate log;

pub mod core;
pub mod logging;

#[cfg(target_os = "linux")]
pub mod dpi;
#[cfg(target_os = "linux")]
pub mod linux;

use std::fmt;
use std::io;

/// Failure modes of a device read or write.
#[derive(Debug)]
pub enum IoError {
    /// Indicates a failed system call, with a description of the operation.
    Os(&'static str, io::Error),
    /// Indicates the device returned zero bytes.
    Closed(&'static str),
    /// Indicates only part of a frame could be written.
    ShortWrite { wrote: usize, len: usize },
    /// Indicates a received frame larger than the accepted bound.
    Oversize { len: usize, max: usize },
    /// Indicates a read would block although the device polled as readable.
    WouldBlock,
}

#[derive(Debug)]
pub enum Error {
    /// Indicates the device could not be opened, created or queried.
    Config(String),
    /// Indicates a transmit frame would exceed the maximum frame length.
    SizeLimit(usize),
    /// Indicates an attempt to send a frame with no bytes.
    EmptyFrame,
    /// Indicates a receive frame offset outside of the held frame. Signed,
    /// since offsets from C may be negative.
    Range(i64),
    /// Indicates a device read or write failure.
    IO(IoError),
    /// Indicates an unknown or already destroyed handle.
    Handle(i64),
    /// Indicates a missing or malformed argument at the C boundary.
    Param(&'static str),
}

impl Error {
    /// Builds a configuration error from a failed system call.
    pub fn config(context: &str, err: &io::Error) -> Error {
        Error::Config(format!("{}{}", context, describe(err)))
    }

    pub fn is_io(&self) -> bool {
        match *self {
            Error::IO(_) => true,
            _ => false,
        }
    }

    pub fn is_config(&self) -> bool {
        match *self {
            Error::Config(_) => true,
            _ => false,
        }
    }
}

/// Formats an OS error as "Error code N: description".
pub fn describe(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => {
            let text = err.to_string();
            // std appends " (os error N)", which duplicates the code.
            let text = match text.rfind(" (os error ") {
                Some(i) => text[..i].to_string(),
                None => text,
            };
            format!("Error code {}: {}", code, text)
        }
        None => err.to_string(),
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            IoError::Os(context, ref err) => write!(f, "{}: {}", context, describe(err)),
            IoError::Closed(context) => write!(f, "{}: the device returned no data.", context),
            IoError::ShortWrite { wrote, len } => write!(
                f,
                "Error writing data to the TAP interface, only {} of {} frame bytes could be written.",
                wrote, len
            ),
            IoError::Oversize { len, max } => write!(
                f,
                "Error reading data from the TAP interface, the received frame of {} bytes exceeds the limit of {}.",
                len, max
            ),
            IoError::WouldBlock => write!(
                f,
                "Error reading data from the TAP interface, the read would block after a successful poll."
            ),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref msg) => write!(f, "{}", msg),
            Error::SizeLimit(max) => write!(f, "The frame size exceeds the limit of {} bytes.", max),
            Error::EmptyFrame => write!(f, "The frame to send is empty."),
            Error::Range(offset) => write!(
                f,
                "The received frame byte offset {} is out of range.",
                offset
            ),
            Error::IO(ref err) => write!(f, "{}", err),
            Error::Handle(handle) => write!(f, "Invalid handle {}.", handle),
            Error::Param(name) => write!(f, "Invalid {} parameter.", name),
        }
    }
}

impl std::error::Error for Error {}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Error::IO(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
