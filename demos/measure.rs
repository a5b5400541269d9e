//! Measure Example
//!
//! This example demonstrates the single-shot operations of the rangefinder:
//! - Listing and selecting serial ports
//! - Reading temperature and signal quality
//! - Taking a raw and a user-calibrated distance measurement
//!
//! Usage:
//!   cargo run --example measure                   # Interactive mode
//!   cargo run --example measure -- /dev/ttyUSB0
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=trace cargo run --example measure    # show every frame

use dls_protocol::{Dls, Response, Result};
use inquire::Select;
use log::info;

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = Dls::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

    let selection = Select::new("Select a serial port:", port_names)
        .prompt()
        .map_err(|e| std::io::Error::other(format!("Selection cancelled: {}", e)))?;
    Ok(selection)
}

fn print_tenths(label: &str, unit: &str, response: Response) {
    match response.tenths() {
        Some(value) => info!("{}: {:6.1} {}", label, value, unit),
        None => info!("{}: failed ({})", label, response.outcome()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port_name = std::env::args()
        .nth(1)
        .map(Ok)
        .unwrap_or_else(select_port)?;

    info!("Connecting to rangefinder on {}...", port_name);
    let mut dls = Dls::open(&port_name)?;

    print_tenths("Temperature", "C", dls.read_temperature()?);
    info!("Signal quality: {}", dls.signal_quality()?.outcome());

    print_tenths("Distance", "mm", dls.measure_once()?);

    dls.set_user_calibrated(true);
    print_tenths("Distance (user calibrated)", "mm", dls.measure_once()?);

    Ok(())
}
