//! Linux TAP devices.

pub mod libc;
pub mod tap;

use crate::core::bridge::Bridge;
use crate::core::config::Config;
use crate::Result;

use self::tap::Tap;

/// Opens or creates the configured TAP interface and wraps it in a bridge.
///
/// Any frames already queued on the interface are dropped before returning.
/// On error the interface is closed again.
pub fn open(config: &Config) -> Result<Bridge<Tap>> {
    let tap = Tap::open(&config.name)?;
    Bridge::new(tap, config)
}
