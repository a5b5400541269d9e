//! # DLS Protocol Library
//!
//! A Rust library for controlling Dimetix laser distance sensors over their
//! ASCII serial protocol (115200 baud, 8N1, CR LF terminated lines).
//!
//! ## Features
//!
//! - Single-shot and user-calibrated distance measurements
//! - Tracking mode with a pull-based sample loop and cooperative cancellation
//! - Temperature, signal quality and laser control
//! - User offset/gain calibration (gain fitted to the device's 7-bit fraction)
//! - Averaging filter configuration with the device's rejection constraint
//!   checked before anything is sent
//! - Decoding of every device error code into a readable cause
//!
//! ## Example
//!
//! ```no_run
//! use dls_protocol::Dls;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dls = Dls::open("/dev/ttyUSB0")?;
//!     if let Some(mm) = dls.measure_once()?.tenths() {
//!         println!("Distance: {:6.1} mm", mm);
//!     }
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod codec;
pub mod codes;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use codec::{Command, FilterReply};
pub use codes::DeviceFault;
pub use error::{DlsError, Result};
pub use protocol::Dls;
pub use transport::{SerialTransport, Transport};
pub use types::*;
