use std::io;
use std::net::Ipv4Addr;

/// A low level interface for exchanging raw ethernet frames with a device.
///
/// Every method maps onto exactly one underlying operation and reports its
/// raw result. Retrying interrupted calls and classifying short or empty
/// transfers is left to the caller, see [retry](fn.retry.html).
pub trait Link {
    /// Writes a frame to the device and returns the number of bytes written.
    fn send(&mut self, buffer: &[u8]) -> io::Result<usize>;

    /// Reads a single frame from the device into the buffer and returns its
    /// size. Frames larger than the buffer are truncated to the buffer size.
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Returns true if a frame can be read without blocking. Never blocks.
    fn poll_recv(&mut self) -> io::Result<bool>;

    /// Returns true if the device can accept a write, or has a pending error
    /// condition a write would report. Never blocks.
    fn poll_send(&mut self) -> io::Result<bool>;

    /// Returns the [MTU](https://en.wikipedia.org/wiki/Maximum_transmission_unit)
    /// of the device.
    fn get_max_transmission_unit(&self) -> io::Result<usize>;

    /// Returns the IPv4 address assigned to the device.
    fn get_ipv4_addr(&self) -> io::Result<Ipv4Addr>;
}

/// Calls f until it returns something other than an interrupted error.
pub fn retry<F, T>(mut f: F) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    loop {
        match f() {
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            res => return res,
        }
    }
}
