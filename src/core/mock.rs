//! A scripted Link for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::rc::Rc;

use crate::core::link::Link;

#[derive(Debug)]
struct State {
    rx_queue: VecDeque<Vec<u8>>,
    recv_errors: VecDeque<io::Error>,
    send_results: VecDeque<io::Result<usize>>,
    sent: Vec<Vec<u8>>,
    interrupts: usize,
    writable: bool,
    recv_calls: usize,
    send_calls: usize,
    mtu: Option<usize>,
    ipv4_addr: Option<Ipv4Addr>,
}

/// A Link backed by in-memory queues. Clones share state, so a test can keep
/// a clone to inject frames and inspect writes after handing one to a bridge.
#[derive(Clone, Debug)]
pub struct MockLink {
    state: Rc<RefCell<State>>,
}

impl MockLink {
    pub fn new(mtu: usize) -> MockLink {
        MockLink {
            state: Rc::new(RefCell::new(State {
                rx_queue: VecDeque::new(),
                recv_errors: VecDeque::new(),
                send_results: VecDeque::new(),
                sent: Vec::new(),
                interrupts: 0,
                writable: true,
                recv_calls: 0,
                send_calls: 0,
                mtu: Some(mtu),
                ipv4_addr: Some(Ipv4Addr::new(10, 0, 0, 101)),
            })),
        }
    }

    /// Queues a frame as if an external agent had written it to the device.
    pub fn inject(&self, frame: Vec<u8>) {
        self.state.borrow_mut().rx_queue.push_back(frame);
    }

    /// Makes the next read fail with err while the device polls as readable.
    pub fn fail_recv(&self, err: io::Error) {
        self.state.borrow_mut().recv_errors.push_back(err);
    }

    /// Scripts the outcome of the next write.
    pub fn script_send(&self, res: io::Result<usize>) {
        self.state.borrow_mut().send_results.push_back(res);
    }

    /// Makes the next n calls of any kind fail with EINTR.
    pub fn interrupt(&self, n: usize) {
        self.state.borrow_mut().interrupts += n;
    }

    pub fn set_writable(&self, writable: bool) {
        self.state.borrow_mut().writable = writable;
    }

    pub fn fail_mtu(&self) {
        self.state.borrow_mut().mtu = None;
    }

    pub fn fail_ipv4_addr(&self) {
        self.state.borrow_mut().ipv4_addr = None;
    }

    /// Returns every frame written so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    pub fn queued(&self) -> usize {
        self.state.borrow().rx_queue.len()
    }

    pub fn recv_calls(&self) -> usize {
        self.state.borrow().recv_calls
    }

    pub fn send_calls(&self) -> usize {
        self.state.borrow().send_calls
    }

    fn interrupted(&self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.interrupts > 0 {
            state.interrupts -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        Ok(())
    }
}

impl Link for MockLink {
    fn send(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.interrupted()?;
        let mut state = self.state.borrow_mut();
        state.send_calls += 1;
        let wrote = match state.send_results.pop_front() {
            Some(res) => res?,
            None => buffer.len(),
        };
        if wrote > 0 {
            state.sent.push(buffer[.. wrote].to_vec());
        }
        Ok(wrote)
    }

    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.interrupted()?;
        let mut state = self.state.borrow_mut();
        state.recv_calls += 1;
        if let Some(err) = state.recv_errors.pop_front() {
            return Err(err);
        }
        match state.rx_queue.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buffer.len());
                buffer[.. len].copy_from_slice(&frame[.. len]);
                Ok(len)
            }
            None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
        }
    }

    fn poll_recv(&mut self) -> io::Result<bool> {
        self.interrupted()?;
        let state = self.state.borrow();
        Ok(!state.rx_queue.is_empty() || !state.recv_errors.is_empty())
    }

    fn poll_send(&mut self) -> io::Result<bool> {
        self.interrupted()?;
        Ok(self.state.borrow().writable)
    }

    fn get_max_transmission_unit(&self) -> io::Result<usize> {
        self.state
            .borrow()
            .mtu
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENODEV))
    }

    fn get_ipv4_addr(&self) -> io::Result<Ipv4Addr> {
        self.state
            .borrow()
            .ipv4_addr
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EADDRNOTAVAIL))
    }
}
