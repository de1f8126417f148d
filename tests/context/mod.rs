use std::ffi::CString;
use std::io;
use std::mem;
use std::sync::Mutex;
use std::thread;
use std::time::{
    Duration,
    Instant,
};

use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use tapbridge::core::bridge::Bridge;
use tapbridge::core::config::Config;
use tapbridge::linux::tap::Tap;

/// Interface the tests run against. It must exist or be creatable, be UP,
/// and have an IPv4 address, e.g.
///
/// ```text
/// sudo ip tuntap add mode tap user $USER name tap0
/// sudo ip addr add 10.0.0.101/24 dev tap0
/// sudo ip link set tap0 up
/// ```
pub const TAP: &str = "tap0";

/// IEEE local experimental ethertype, so test frames are easy to pick out.
pub const ETH_TYPE_TEST: u16 = 0x88B5;

pub const TIMEOUT: Duration = Duration::from_secs(1);

lazy_static! {
    static ref TEST: Mutex<()> = Mutex::new(());
}

/// Runs a function f in an exclusive context. This is important so that tests
/// run independently and do not share the TAP interface.
pub fn run<F, R>(config: Config, f: F) -> R
where
    F: FnOnce(&mut Bridge<Tap>) -> R,
{
    let _ = env_logger::try_init();

    // Assertion failures cause panics and poison the mutex.
    let _guard = match TEST.lock() {
        Ok(guard) => guard,
        Err(err) => err.into_inner(),
    };

    let mut bridge = tapbridge::linux::open(&config).unwrap();
    f(&mut bridge)
}

pub fn config() -> Config {
    Config::with_name(TAP).verbose(true).log_prefix("test: ")
}

/// Builds a broadcast frame with the test ethertype and random payload.
pub fn test_frame(len: usize) -> Vec<u8> {
    assert!(len >= 14);
    let mut frame: Vec<u8> = (0 .. len).map(|_| rand::random::<u8>()).collect();
    frame[0 .. 6].copy_from_slice(&[0xFF; 6]);
    frame[6 .. 12].copy_from_slice(&[0x06, 0x11, 0x22, 0x33, 0x44, 0x55]);
    NetworkEndian::write_u16(&mut frame[12 .. 14], ETH_TYPE_TEST);
    frame
}

pub fn is_test_frame(frame: &[u8]) -> bool {
    frame.len() >= 14 && NetworkEndian::read_u16(&frame[12 .. 14]) == ETH_TYPE_TEST
}

/// Steps the bridge until a test frame is held, discarding unrelated
/// traffic such as IPv6 neighbour discovery.
pub fn step_until_test_frame(bridge: &mut Bridge<Tap>) -> Option<Vec<u8>> {
    let since = Instant::now();

    while since.elapsed() < TIMEOUT {
        if bridge.step().unwrap().received_len > 0 {
            if is_test_frame(bridge.held_frame()) {
                return Some(bridge.held_frame().to_vec());
            }
            bridge.discard_frame();
        }
        thread::sleep(Duration::from_micros(100));
    }

    None
}

/// A raw packet socket bound to the host side of the TAP interface.
pub struct HostSocket {
    fd: libc::c_int,
    ifindex: libc::c_int,
}

impl HostSocket {
    pub fn open(ifname: &str) -> HostSocket {
        unsafe {
            let protocol = (libc::ETH_P_ALL as u16).to_be() as libc::c_int;
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK,
                protocol,
            );
            if fd == -1 {
                panic!("Opening packet socket: {}.", io::Error::last_os_error());
            }

            let name = CString::new(ifname).unwrap();
            let ifindex = libc::if_nametoindex(name.as_ptr()) as libc::c_int;
            assert!(ifindex > 0);

            let mut addr: libc::sockaddr_ll = mem::zeroed();
            addr.sll_family = libc::AF_PACKET as u16;
            addr.sll_protocol = protocol as u16;
            addr.sll_ifindex = ifindex;

            if libc::bind(
                fd,
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            ) == -1
            {
                panic!("Binding packet socket: {}.", io::Error::last_os_error());
            }

            HostSocket { fd, ifindex }
        }
    }

    /// Sends a frame out of the host side, so the TAP file descriptor reads it.
    pub fn send(&self, frame: &[u8]) -> io::Result<usize> {
        unsafe {
            let mut addr: libc::sockaddr_ll = mem::zeroed();
            addr.sll_family = libc::AF_PACKET as u16;
            addr.sll_ifindex = self.ifindex;
            addr.sll_halen = 6;
            addr.sll_addr[.. 6].copy_from_slice(&frame[0 .. 6]);

            let sent = libc::sendto(
                self.fd,
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );

            if sent == -1 {
                Err(io::Error::last_os_error())
            } else {
                Ok(sent as usize)
            }
        }
    }

    /// Waits for a test frame written to the TAP file descriptor.
    pub fn recv_test_frame(&self) -> Option<Vec<u8>> {
        let since = Instant::now();
        let mut buffer = vec![0; 65536];

        while since.elapsed() < TIMEOUT {
            let read = unsafe {
                libc::recv(
                    self.fd,
                    buffer.as_mut_ptr() as *mut libc::c_void,
                    buffer.len(),
                    0,
                )
            };

            if read > 0 && is_test_frame(&buffer[.. read as usize]) {
                return Some(buffer[.. read as usize].to_vec());
            }

            thread::sleep(Duration::from_micros(100));
        }

        None
    }
}

impl Drop for HostSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
