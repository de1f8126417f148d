use std::convert::TryFrom;
use std::ffi::CStr;
use std::io;
use std::net::Ipv4Addr;

use byteorder::{
    ByteOrder,
    NativeEndian,
};

use crate::core::link::Link;
use crate::linux::libc::{
    self as _libc,
    c_ifreq,
    Fd,
};
use crate::{
    Error,
    Result,
};

const TUN_CLONE_DEVICE: &[u8] = b"/dev/net/tun\0";

/// Checks that ifr_name fits in an ifreq with its terminating NUL.
pub fn check_name(ifr_name: &str) -> Result<()> {
    if ifr_name.is_empty() || ifr_name.len() >= libc::IF_NAMESIZE || ifr_name.contains('\0') {
        return Err(Error::Config(format!(
            "Invalid TAP interface name \"{}\", expected 1 to {} bytes.",
            ifr_name.escape_default(),
            libc::IF_NAMESIZE - 1
        )));
    }

    Ok(())
}

/// [TAP interface](https://www.kernel.org/doc/Documentation/networking/tuntap.txt)
/// for sending and receiving raw ethernet frames.
#[derive(Debug)]
pub struct Tap {
    fd: Fd,
    name: String,
}

impl Tap {
    /// Creates or binds to an existing TAP interface with the specified name.
    ///
    /// Binding succeeds if the interface exists with the same flags and is
    /// owned by the caller. Otherwise a new interface is created, which needs
    /// the CAP_NET_ADMIN capability. There is no way to only open an existing
    /// interface.
    pub fn open(ifr_name: &str) -> Result<Tap> {
        check_name(ifr_name)?;

        let path = CStr::from_bytes_with_nul(TUN_CLONE_DEVICE)
            .map_err(|_| Error::Config("Invalid TUN/TAP clone device path.".to_string()))?;

        let fd = Fd::open(path, libc::O_RDWR).map_err(|err| {
            Error::config(
                &format!(
                    "Error opening TUN/TAP clone device {:?}: ",
                    path
                ),
                &err,
            )
        })?;

        let mut ifreq = c_ifreq::with_name(ifr_name);
        ifreq.ifr_ifru.ifr_flags = _libc::IFF_TAP | _libc::IFF_NO_PI;

        fd.ioctl(_libc::TUNSETIFF, &mut ifreq).map_err(|err| {
            Error::config(
                &format!("Error opening/creating TAP interface \"{}\": ", ifr_name),
                &err,
            )
        })?;

        Ok(Tap {
            fd,
            name: ifr_name.to_string(),
        })
    }

    /// Runs an interface query on a throwaway socket, which is closed on
    /// return.
    fn inet_ioctl(&self, request: libc::c_ulong) -> io::Result<c_ifreq> {
        let socket = Fd::socket(libc::AF_INET, libc::SOCK_DGRAM, 0)?;
        let mut ifreq = c_ifreq::with_name(&self.name);
        socket.ioctl(request, &mut ifreq)?;
        Ok(ifreq)
    }
}

impl Link for Tap {
    fn send(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.fd.write(buffer)
    }

    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.fd.read(buffer)
    }

    fn poll_recv(&mut self) -> io::Result<bool> {
        self.fd.poll(libc::POLLIN)
    }

    fn poll_send(&mut self) -> io::Result<bool> {
        self.fd.poll(libc::POLLOUT | libc::POLLERR)
    }

    fn get_max_transmission_unit(&self) -> io::Result<usize> {
        let ifreq = self.inet_ioctl(_libc::SIOCGIFMTU)?;
        let mtu = unsafe { ifreq.ifr_ifru.ifr_mtu };

        usize::try_from(mtu).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid MTU {}.", mtu),
            )
        })
    }

    fn get_ipv4_addr(&self) -> io::Result<Ipv4Addr> {
        let ifreq = self.inet_ioctl(_libc::SIOCGIFADDR)?;
        let c_addr = unsafe { &ifreq.ifr_ifru.ifr_addr };

        if c_addr.sa_family != libc::AF_INET as libc::sa_family_t {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Ipv4 address not found.",
            ));
        }

        let c_addr_in = unsafe { &*(c_addr as *const libc::sockaddr as *const libc::sockaddr_in) };

        // s_addr holds the address in network order, so its in-memory bytes
        // are the octets.
        let mut octets = [0; 4];
        NativeEndian::write_u32(&mut octets, c_addr_in.sin_addr.s_addr);

        Ok(Ipv4Addr::from(octets))
    }
}
