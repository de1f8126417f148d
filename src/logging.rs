//! Default log backend for hosts that cannot install one, such as a
//! simulator linking the static library.
//!
//! Log lines are written to stderr without decoration. `RUST_LOG` overrides
//! the default `info` filter. A logger already installed by the host wins.

use std::env;
use std::io::Write;
use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs the default backend unless a logger is already set.
pub fn init() {
    INIT.call_once(|| {
        let mut builder = Builder::new();
        builder.filter(None, LevelFilter::Info);

        if let Ok(filters) = env::var("RUST_LOG") {
            builder.parse(&filters);
        }

        builder.format(|buf, record| {
            #[cfg(test)]
            capture::push(record.args().to_string());
            writeln!(buf, "{}", record.args())
        });

        let _ = builder.try_init();
    });
}
