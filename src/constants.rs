//! Protocol constants for Dimetix rangefinder communication.
//!
//! This module defines the constants used by the ASCII line protocol,
//! including serial port configuration, frame layout and the limits the
//! device enforces on calibration parameters.

use std::time::Duration;

/// Baud rate (115200 bps, 8N1)
pub const BAUD_RATE: u32 = 115_200;

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Line terminator for both requests and responses
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// Size of the response line buffer, terminator included
pub const MAX_READ_SIZE: usize = 20;

/// Per-read timeout in deciseconds
pub const DEFAULT_TIMEOUT_DECISECONDS: u8 = 5;

/// Total time allowed for one response line in non-blocking mode
pub const DEFAULT_RESPONSE_DEADLINE: Duration = Duration::from_secs(2);

/// Pause between empty reads while polling for a response
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Device address used when none is configured
pub const DEFAULT_DEVICE_ID: u8 = 0;

/// Highest address that fits the single character after `s`/`g`
pub const MAX_DEVICE_ID: u8 = 9;

/// Column of the character that discriminates the response kind
pub const DISCRIMINATOR_INDEX: usize = 2;

/// Discriminator marking an error frame
pub const ERROR_MARKER: u8 = b'@';

/// Discriminator marking a boolean/acknowledgement frame
pub const BOOLEAN_MARKER: u8 = b'?';

/// Column of the 3-digit error code in an error frame
pub const ERROR_CODE_OFFSET: usize = 4;

/// Width of the error code field
pub const ERROR_CODE_WIDTH: usize = 3;

/// Column of the data field in a plain data frame
pub const DATA_FIELD_OFFSET: usize = 4;

/// Extra columns the device inserts in user-calibrated replies
pub const USER_CALIBRATED_SHIFT: usize = 1;

/// Width of the data field
pub const DATA_FIELD_WIDTH: usize = 8;

/// Columns of the samples, spikes and errors fields in a filter reply
pub const FILTER_FIELD_OFFSETS: [usize; 3] = [5, 8, 11];

/// Width of each filter reply field
pub const FILTER_FIELD_WIDTH: usize = 2;

/// Largest numerator/denominator representable in the 7-bit gain registers
pub const GAIN_LIMIT: u8 = 127;

/// Maximum number of samples the averaging filter accepts
pub const FILTER_MAX_SAMPLES: u8 = 32;

/// Minimum number of samples the averaging filter accepts
pub const FILTER_MIN_SAMPLES: u8 = 1;

/// `2 * spikes + errors` must not exceed this fraction of `samples`
pub const FILTER_REJECT_RATIO: f64 = 0.4;

/// Resolution of the tracking delay field
pub const TRACKING_TICK: Duration = Duration::from_millis(10);

/// Largest value of the 3-digit tracking delay field
pub const MAX_TRACKING_DELAY_TICKS: u16 = 999;
