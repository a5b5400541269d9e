//! Tracking Example
//!
//! Continuously prints distance samples until a key is pressed.
//!
//! Usage:
//!   cargo run --example track -- /dev/ttyUSB0            # maximum rate
//!   cargo run --example track -- /dev/ttyUSB0 1000       # one sample per second
//!
//! The delay is in milliseconds and is rounded down to 10 ms steps. The
//! sensor reports an error if samples are requested faster than it can
//! measure.

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use dls_protocol::constants::DEFAULT_PORT;
use dls_protocol::{Dls, Result, SessionConfig};
use log::{error, info};
use std::time::Duration;

/// True once any key has been pressed
fn key_pressed() -> bool {
    match event::poll(Duration::ZERO) {
        Ok(true) => matches!(
            event::read(),
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press
        ),
        Ok(false) => false,
        Err(e) => {
            error!("Failed to poll keyboard: {}", e);
            true
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let port_name = args.next().unwrap_or_else(|| DEFAULT_PORT.to_string());
    let delay = args
        .next()
        .and_then(|ms| ms.parse::<u64>().ok())
        .map(Duration::from_millis);

    info!("Connecting to rangefinder on {}...", port_name);
    let mut dls = Dls::with_config(&SessionConfig::new(&port_name))?;

    info!("Tracking, press any key to stop");
    terminal::enable_raw_mode()?;
    let result = dls.track(delay, key_pressed, |sample| {
        match sample.response.tenths() {
            Some(mm) => print!("{:6.1} mm\r\n", mm),
            None => print!("error {}\r\n", sample.response.outcome()),
        }
    });
    terminal::disable_raw_mode()?;

    let stopped = result?;
    info!("Tracking stopped ({})", stopped.outcome());
    Ok(())
}
