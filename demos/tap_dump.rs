extern crate byteorder;
#[macro_use]
extern crate clap;
extern crate env_logger;
extern crate tapbridge;

use std::thread;
use std::time::Duration;

use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use tapbridge::core::config::{
    Config,
    DEFAULT_MTU_MARGIN,
};

fn mac(buffer: &[u8]) -> String {
    buffer
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Opens a TAP interface and prints every frame it receives, one step per
/// tick. Run with RUST_LOG=debug to see the bridge's own logging.
fn main() {
    env_logger::init();

    let margin = DEFAULT_MTU_MARGIN.to_string();

    let matches = clap::App::new("tap_dump")
        .about("Prints frames received on a TAP interface")
        .arg(
            clap::Arg::with_name("tap")
                .long("tap")
                .value_name("TAP")
                .help("Linux TAP interface")
                .default_value("tap0")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .help("Prefix for informational log lines")
                .default_value("")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("mtu-margin")
                .long("mtu-margin")
                .value_name("BYTES")
                .help("Bytes accepted past the MTU")
                .default_value(&margin)
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("tick-us")
                .long("tick-us")
                .value_name("MICROSECONDS")
                .help("Delay between steps")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log the interface address and MTU once opened"),
        )
        .get_matches();

    let mtu_margin = value_t!(matches, "mtu-margin", usize).unwrap_or_else(|e| e.exit());
    let tick = value_t!(matches, "tick-us", u64).unwrap_or_else(|e| e.exit());

    let config = Config::with_name(matches.value_of("tap").unwrap())
        .verbose(matches.is_present("verbose"))
        .log_prefix(matches.value_of("prefix").unwrap())
        .mtu_margin(mtu_margin);

    let mut bridge = match tapbridge::linux::open(&config) {
        Ok(bridge) => bridge,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    println!(
        "{} is open (MTU = {}, IPv4 = {})",
        bridge.name(),
        bridge.mtu(),
        bridge.ipv4_addr()
    );

    loop {
        match bridge.step() {
            Ok(readiness) if readiness.received_len > 0 => {
                let frame = bridge.held_frame();
                if frame.len() >= 14 {
                    println!(
                        "{} -> {} type 0x{:04x} ({} bytes)",
                        mac(&frame[6 .. 12]),
                        mac(&frame[0 .. 6]),
                        NetworkEndian::read_u16(&frame[12 .. 14]),
                        frame.len()
                    );
                } else {
                    println!("runt frame ({} bytes)", frame.len());
                }
                bridge.discard_frame();
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }

        thread::sleep(Duration::from_micros(tick));
    }
}
