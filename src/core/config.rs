//! Settings used to open a bridge.

/// Default number of bytes accepted past the MTU.
///
/// A TAP interface with an MTU of 1500 accepts somewhat larger frames, and
/// 36 extra bytes give the 1536 byte ceiling common to ethernet controller
/// cores. This is a platform tuning value, not a protocol constant.
pub const DEFAULT_MTU_MARGIN: usize = 36;

/// Default TAP interface name.
pub const DEFAULT_NAME: &str = "tap0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Name of the TAP interface to open or create.
    pub name: String,
    /// Whether to log an informational line once the device is open.
    pub verbose: bool,
    /// Text prepended to informational log lines.
    pub log_prefix: String,
    /// Bytes accepted past the MTU, in both directions.
    pub mtu_margin: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            name: DEFAULT_NAME.to_string(),
            verbose: false,
            log_prefix: String::new(),
            mtu_margin: DEFAULT_MTU_MARGIN,
        }
    }
}

impl Config {
    /// Creates a default config for the named interface.
    pub fn with_name(name: &str) -> Config {
        Config {
            name: name.to_string(),
            ..Config::default()
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Config {
        self.verbose = verbose;
        self
    }

    pub fn log_prefix(mut self, log_prefix: &str) -> Config {
        self.log_prefix = log_prefix.to_string();
        self
    }

    pub fn mtu_margin(mut self, mtu_margin: usize) -> Config {
        self.mtu_margin = mtu_margin;
        self
    }
}
