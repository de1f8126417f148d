//! Fixed capacity transmit and receive frame buffers.
//!
//! Both buffers are allocated once, sized from the device MTU plus a safety
//! margin. The receive buffer carries one extra byte so a single read can
//! tell a frame exactly at the limit apart from one past it.

use crate::{
    Error,
    IoError,
    Result,
};

/// Frame size bounds derived from a device MTU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity {
    mtu: usize,
    margin: usize,
}

impl Capacity {
    /// Returns an error if the buffer length does not fit in a usize.
    pub fn new(mtu: usize, margin: usize) -> Result<Capacity> {
        match mtu.checked_add(margin).and_then(|len| len.checked_add(1)) {
            Some(_) => Ok(Capacity { mtu, margin }),
            None => Err(Error::Config(format!(
                "Invalid frame size limit, MTU {} plus margin {} is too large.",
                mtu, margin
            ))),
        }
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Returns the largest frame accepted in either direction.
    pub fn max_frame_len(&self) -> usize {
        self.mtu + self.margin
    }

    /// Returns the size of the backing buffers.
    pub fn buffer_len(&self) -> usize {
        self.max_frame_len() + 1
    }
}

fn alloc(len: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| {
        Error::Config(format!(
            "Error allocating a frame buffer of {} bytes.",
            len
        ))
    })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// A frame being assembled for transmission, one byte at a time.
#[derive(Debug)]
pub struct TxFrame {
    buffer: Vec<u8>,
    len: usize,
    max_len: usize,
}

impl TxFrame {
    pub fn new(capacity: Capacity) -> Result<TxFrame> {
        Ok(TxFrame {
            buffer: alloc(capacity.buffer_len())?,
            len: 0,
            max_len: capacity.max_frame_len(),
        })
    }

    /// Starts a new frame. Bytes of the previous frame are left as garbage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends a byte or returns an error, leaving the frame unchanged, if
    /// the frame is already at the maximum length.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.len >= self.max_len {
            return Err(Error::SizeLimit(self.max_len));
        }

        self.buffer[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[.. self.len]
    }
}

/// A received frame held for the caller.
#[derive(Debug)]
pub struct RxFrame {
    buffer: Vec<u8>,
    len: usize,
    max_len: usize,
}

impl RxFrame {
    pub fn new(capacity: Capacity) -> Result<RxFrame> {
        Ok(RxFrame {
            buffer: alloc(capacity.buffer_len())?,
            len: 0,
            max_len: capacity.max_frame_len(),
        })
    }

    /// Returns the whole backing buffer for a device read. Must only be
    /// used while no frame is held.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        debug_assert_eq!(self.len, 0);
        &mut self.buffer[..]
    }

    /// Marks the first len bytes of the buffer as a held frame, or returns an
    /// error if len is past the maximum frame length. A rejected frame leaves
    /// nothing held.
    pub fn hold(&mut self, len: usize) -> Result<usize> {
        if len > self.max_len {
            self.len = 0;
            return Err(Error::IO(IoError::Oversize {
                len,
                max: self.max_len,
            }));
        }

        self.len = len;
        Ok(len)
    }

    /// Returns the byte at offset in the held frame.
    pub fn byte(&self, offset: usize) -> Result<u8> {
        if offset >= self.len {
            return Err(Error::Range(offset as i64));
        }

        Ok(self.buffer[offset])
    }

    /// Drops the held frame, if any.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[.. self.len]
    }
}
