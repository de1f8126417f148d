use std::ffi::CStr;
use std::io;

pub const IFF_TAP: libc::c_short = 0x0002;

pub const IFF_NO_PI: libc::c_short = 0x1000;

pub const TUNSETIFF: libc::c_ulong = 0x400454CA;

pub const SIOCGIFADDR: libc::c_ulong = 0x8915;

pub const SIOCGIFMTU: libc::c_ulong = 0x8921;

#[repr(C)]
#[derive(Clone, Copy)]
#[allow(non_camel_case_types)]
pub union c_ifr_ifru {
    pub ifr_addr: libc::sockaddr,
    pub ifr_flags: libc::c_short,
    pub ifr_mtu: libc::c_int,
    ifr_pad: [u8; 24],
}

#[repr(C)]
#[derive(Clone, Copy)]
#[allow(non_camel_case_types)]
/// [https://linux.die.net/man/7/netdevice](https://linux.die.net/man/7/netdevice)
pub struct c_ifreq {
    pub ifr_name: [libc::c_char; libc::IF_NAMESIZE],
    pub ifr_ifru: c_ifr_ifru,
}

impl c_ifreq {
    pub fn with_name(ifr_name: &str) -> c_ifreq {
        assert!(ifr_name.len() < libc::IF_NAMESIZE);

        let mut ifreq = c_ifreq {
            ifr_name: [0; libc::IF_NAMESIZE],
            ifr_ifru: c_ifr_ifru { ifr_pad: [0; 24] },
        };

        for (i, c) in ifr_name.as_bytes().iter().enumerate() {
            ifreq.ifr_name[i] = *c as libc::c_char;
        }

        ifreq
    }
}

fn cvt(res: libc::c_int) -> io::Result<libc::c_int> {
    if res == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res)
    }
}

fn cvt_size(res: libc::ssize_t) -> io::Result<usize> {
    if res == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res as usize)
    }
}

/// An owned file descriptor, closed exactly once when dropped.
///
/// Every method is a single system call. An interrupted call is reported as
/// an error of kind `Interrupted` and is not retried here.
#[derive(Debug)]
pub struct Fd(libc::c_int);

impl Fd {
    pub fn open(path: &CStr, flags: libc::c_int) -> io::Result<Fd> {
        cvt(unsafe { libc::open(path.as_ptr(), flags) }).map(Fd)
    }

    pub fn socket(domain: libc::c_int, ty: libc::c_int, protocol: libc::c_int) -> io::Result<Fd> {
        cvt(unsafe { libc::socket(domain, ty, protocol) }).map(Fd)
    }

    pub fn ioctl(&self, request: libc::c_ulong, ifreq: &mut c_ifreq) -> io::Result<()> {
        cvt(unsafe { libc::ioctl(self.0, request as _, ifreq as *mut c_ifreq) }).map(|_| ())
    }

    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        cvt_size(unsafe { libc::read(self.0, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) })
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        cvt_size(unsafe { libc::write(self.0, buf.as_ptr() as *const libc::c_void, buf.len()) })
    }

    /// Polls for the events with a zero timeout and returns true if any of
    /// them, or an error condition, is pending.
    pub fn poll(&self, events: libc::c_short) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: self.0,
            events,
            revents: 0,
        };

        let res = cvt(unsafe { libc::poll(&mut pollfd, 1, 0) })?;
        Ok(res > 0)
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        loop {
            let res = unsafe { libc::close(self.0) };

            if res == -1 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
                continue;
            }

            debug_assert_eq!(res, 0, "close({}): {}", self.0, io::Error::last_os_error());
            break;
        }
    }
}
