//! C entry points for simulators, e.g. Verilog DPI imports.
//!
//! A simulator can only hold integers and fixed width return codes, so
//! bridges live in a process-wide handle table and every function returns
//! `RET_SUCCESS` or `RET_FAILURE`. The full error text is logged with
//! `error!` instead of being returned, through the default backend in
//! [logging](../logging/index.html) unless the host installed its own.
//! Panics are caught here and never unwind into the caller.

use std::convert::TryFrom;
use std::ffi::CStr;
use std::panic::{
    self,
    AssertUnwindSafe,
};
use std::sync::{
    Mutex,
    MutexGuard,
};

use libc::{
    c_char,
    c_int,
};

use crate::core::bridge::Bridge;
use crate::core::config::Config;
use crate::core::handles::HandleTable;
use crate::linux;
use crate::linux::tap::Tap;
use crate::logging;
use crate::{
    Error,
    Result,
};

pub const RET_SUCCESS: c_int = 0;

pub const RET_FAILURE: c_int = 1;

const ERROR_MSG_PREFIX: &str = "Error in the Ethernet DPI module: ";

lazy_static! {
    static ref BRIDGES: Mutex<HandleTable<Bridge<Tap>>> = Mutex::new(HandleTable::new());
}

fn bridges() -> MutexGuard<'static, HandleTable<Bridge<Tap>>> {
    // A panic while the lock is held is reported by guard(...), the table
    // itself is still consistent.
    match BRIDGES.lock() {
        Ok(guard) => guard,
        Err(err) => err.into_inner(),
    }
}

/// Runs f, logging any error or panic, and returns a status code.
fn guard<F>(f: F) -> c_int
where
    F: FnOnce() -> Result<()>,
{
    logging::init();

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => RET_SUCCESS,
        Ok(Err(err)) => {
            error!("{}{}", ERROR_MSG_PREFIX, err);
            RET_FAILURE
        }
        Err(_) => {
            error!("{}Unexpected panic.", ERROR_MSG_PREFIX);
            RET_FAILURE
        }
    }
}

fn with_bridge<F>(obj: i64, f: F) -> c_int
where
    F: FnOnce(&mut Bridge<Tap>) -> Result<()>,
{
    guard(|| {
        let mut bridges = bridges();
        let bridge = bridges.get_mut(obj)?;
        f(bridge)
    })
}

/// Opens a bridge on a TAP interface and stores its handle in obj.
///
/// # Safety
///
/// tap_interface_name must be a valid C string and obj must point to
/// writable memory. informational_message_prefix may be null.
#[no_mangle]
pub unsafe extern "C" fn ethernet_dpi_create(
    tap_interface_name: *const c_char,
    print_informational_messages: u8,
    informational_message_prefix: *const c_char,
    obj: *mut i64,
) -> c_int {
    guard(|| {
        if obj.is_null() {
            return Err(Error::Param("obj"));
        }

        // A failed create hands back the null handle.
        *obj = 0;

        if tap_interface_name.is_null() {
            return Err(Error::Param("tap_interface_name"));
        }

        let name = CStr::from_ptr(tap_interface_name)
            .to_str()
            .map_err(|_| Error::Param("tap_interface_name"))?;

        let verbose = match print_informational_messages {
            0 => false,
            1 => true,
            _ => return Err(Error::Param("print_informational_messages")),
        };

        let prefix = if informational_message_prefix.is_null() {
            String::new()
        } else {
            CStr::from_ptr(informational_message_prefix)
                .to_string_lossy()
                .into_owned()
        };

        let config = Config::with_name(name)
            .verbose(verbose)
            .log_prefix(&prefix);

        let bridge = linux::open(&config)?;
        *obj = bridges().insert(bridge);
        Ok(())
    })
}

/// Closes the bridge. Destroying the null handle left by a failed create
/// does nothing, destroying any other handle twice fails.
#[no_mangle]
pub extern "C" fn ethernet_dpi_destroy(obj: i64) -> c_int {
    guard(|| {
        if obj == 0 {
            return Ok(());
        }

        let bridge = bridges().remove(obj)?;
        bridge.close();
        Ok(())
    })
}

/// Steps the bridge once.
///
/// # Safety
///
/// Both out pointers must point to writable memory.
#[no_mangle]
pub unsafe extern "C" fn ethernet_dpi_tick(
    obj: i64,
    received_frame_byte_count: *mut c_int,
    ready_to_send: *mut u8,
) -> c_int {
    with_bridge(obj, |bridge| {
        if received_frame_byte_count.is_null() {
            return Err(Error::Param("received_frame_byte_count"));
        }
        if ready_to_send.is_null() {
            return Err(Error::Param("ready_to_send"));
        }

        let readiness = bridge.step()?;
        *received_frame_byte_count = readiness.received_len as c_int;
        *ready_to_send = readiness.ready_to_send as u8;
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn ethernet_dpi_new_tx_frame(obj: i64) -> c_int {
    with_bridge(obj, |bridge| {
        bridge.begin_frame();
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn ethernet_dpi_add_byte_to_tx_frame(obj: i64, data: c_char) -> c_int {
    with_bridge(obj, |bridge| bridge.append_byte(data as u8))
}

#[no_mangle]
pub extern "C" fn ethernet_dpi_send_tx_frame(obj: i64) -> c_int {
    with_bridge(obj, |bridge| bridge.send_frame())
}

/// Reads a byte of the held frame into data.
///
/// # Safety
///
/// data must point to writable memory.
#[no_mangle]
pub unsafe extern "C" fn ethernet_dpi_get_received_frame_byte(
    obj: i64,
    offset: c_int,
    data: *mut c_char,
) -> c_int {
    with_bridge(obj, |bridge| {
        if data.is_null() {
            return Err(Error::Param("data"));
        }

        let offset = usize::try_from(offset).map_err(|_| Error::Range(offset.into()))?;
        *data = bridge.read_byte(offset)? as c_char;
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn ethernet_dpi_discard_received_frame(obj: i64) -> c_int {
    with_bridge(obj, |bridge| {
        bridge.discard_frame();
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn ethernet_dpi_flush_tap_receive_buffer(obj: i64) -> c_int {
    with_bridge(obj, |bridge| bridge.flush())
}
