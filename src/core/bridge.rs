//! A stepped, non-blocking frame bridge over a Link.
//!
//! The caller drives the bridge with one [step](struct.Bridge.html#method.step)
//! per clock tick. A step captures at most one received frame and reports
//! whether a frame could be sent right now. Received frames are held until
//! the caller discards them, so a held frame is never overwritten.

use std::io;
use std::net::Ipv4Addr;

use crate::core::config::Config;
use crate::core::frame::{
    Capacity,
    RxFrame,
    TxFrame,
};
use crate::core::link::{
    retry,
    Link,
};
use crate::{
    Error,
    IoError,
    Result,
};

const RECV_CONTEXT: &str = "Error reading data from the TAP interface";

const SEND_CONTEXT: &str = "Error writing data to the TAP interface";

/// Result of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Readiness {
    /// Length of the held received frame, or 0 if there is nothing to read.
    pub received_len: usize,
    /// Whether the device can accept a frame without blocking.
    pub ready_to_send: bool,
}

/// A device together with one transmit and one receive frame buffer.
#[derive(Debug)]
pub struct Bridge<L: Link> {
    link: L,
    name: String,
    capacity: Capacity,
    ipv4_addr: Ipv4Addr,
    tx: TxFrame,
    rx: RxFrame,
}

impl<L: Link> Bridge<L> {
    /// Creates a bridge over an opened link.
    ///
    /// Queries the link's IPv4 address and MTU, sizes the frame buffers, and
    /// drops any frames already queued on the device so the caller never sees
    /// stale frames left over from a previous owner. The link is dropped, and
    /// with it the device, if any of these steps fail.
    pub fn new(link: L, config: &Config) -> Result<Bridge<L>> {
        let ipv4_addr = link.get_ipv4_addr().map_err(|err| {
            Error::config(
                &format!(
                    "Error getting the IP address of TAP interface \"{}\": ",
                    config.name
                ),
                &err,
            )
        })?;

        let mtu = link.get_max_transmission_unit().map_err(|err| {
            Error::config(
                &format!(
                    "Error getting the MTU for TAP interface \"{}\": ",
                    config.name
                ),
                &err,
            )
        })?;

        if config.verbose {
            info!(
                "{}Using TAP interface \"{}\", IP addr: {}, MTU: {}.",
                config.log_prefix, config.name, ipv4_addr, mtu
            );
        }

        let capacity = Capacity::new(mtu, config.mtu_margin)?;

        let mut bridge = Bridge {
            link,
            name: config.name.clone(),
            capacity,
            ipv4_addr,
            tx: TxFrame::new(capacity)?,
            rx: RxFrame::new(capacity)?,
        };

        bridge.flush()?;

        Ok(bridge)
    }

    /// Captures a received frame if none is held and reports whether the
    /// device is ready to send. Never blocks.
    pub fn step(&mut self) -> Result<Readiness> {
        let received_len = self.try_receive()?;

        let link = &mut self.link;
        let ready_to_send = retry(|| link.poll_send())
            .map_err(|err| IoError::Os("Error polling the TAP interface to send", err))?;

        Ok(Readiness {
            received_len,
            ready_to_send,
        })
    }

    /// Reads one frame from the device if one is queued and none is held.
    ///
    /// # Returns
    ///
    /// The length of the held frame, or 0 if nothing is held and nothing was
    /// queued. A frame past the maximum frame length is an error and leaves
    /// nothing held.
    pub fn try_receive(&mut self) -> Result<usize> {
        if !self.rx.is_empty() {
            return Ok(self.rx.len());
        }

        let link = &mut self.link;

        let readable = retry(|| link.poll_recv())
            .map_err(|err| IoError::Os("Error polling the TAP interface to receive", err))?;

        if !readable {
            return Ok(0);
        }

        let rx = &mut self.rx;

        let len = match retry(|| link.recv(rx.buffer_mut())) {
            Ok(0) => return Err(IoError::Closed(RECV_CONTEXT).into()),
            Ok(len) => len,
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(IoError::WouldBlock.into());
            }
            Err(err) => return Err(IoError::Os(RECV_CONTEXT, err).into()),
        };

        self.rx.hold(len)?;

        debug!("Received a frame of {} bytes on {}.", len, self.name);
        trace!("Frame data: {}", hex(self.rx.as_slice()));

        Ok(len)
    }

    /// Returns the length of the held frame, or 0 if none is held.
    pub fn held_len(&self) -> usize {
        self.rx.len()
    }

    /// Returns the held frame.
    pub fn held_frame(&self) -> &[u8] {
        self.rx.as_slice()
    }

    /// Returns a byte of the held frame.
    pub fn read_byte(&self, offset: usize) -> Result<u8> {
        self.rx.byte(offset)
    }

    /// Drops the held frame so the next step can capture a new one.
    pub fn discard_frame(&mut self) {
        self.rx.clear();
    }

    /// Silently drops the held frame and every frame queued on the device.
    pub fn flush(&mut self) -> Result<()> {
        self.rx.clear();

        loop {
            let len = self.try_receive()?;
            if len == 0 {
                break;
            }

            debug!("Discarding stale frame with {} bytes.", len);
            self.rx.clear();
        }

        Ok(())
    }

    /// Starts assembling a new transmit frame.
    pub fn begin_frame(&mut self) {
        self.tx.clear();
    }

    /// Appends a byte to the transmit frame.
    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        trace!("Adding tx byte: 0x{:02X}", byte);
        self.tx.push(byte)
    }

    /// Writes the transmit frame to the device in a single write.
    ///
    /// The frame is kept, so sending again without
    /// [begin_frame](#method.begin_frame) repeats it. A partial write is an
    /// error; the remainder is never written.
    pub fn send_frame(&mut self) -> Result<()> {
        if self.tx.is_empty() {
            return Err(Error::EmptyFrame);
        }

        let link = &mut self.link;
        let frame = self.tx.as_slice();

        trace!("Sending frame data: {}", hex(frame));

        match retry(|| link.send(frame)) {
            Ok(0) => Err(IoError::Closed(SEND_CONTEXT).into()),
            Ok(wrote) if wrote != frame.len() => Err(IoError::ShortWrite {
                wrote,
                len: frame.len(),
            }
            .into()),
            Ok(wrote) => {
                debug!("Sent a frame of {} bytes on {}.", wrote, self.name);
                Ok(())
            }
            Err(err) => Err(IoError::Os(SEND_CONTEXT, err).into()),
        }
    }

    /// Returns the number of bytes in the transmit frame.
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn mtu(&self) -> usize {
        self.capacity.mtu()
    }

    pub fn ipv4_addr(&self) -> Ipv4Addr {
        self.ipv4_addr
    }

    /// Closes the device.
    pub fn close(self) {}
}

fn hex(buffer: &[u8]) -> String {
    buffer
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
