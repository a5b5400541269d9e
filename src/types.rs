use crate::codes;
use crate::constants::*;
use crate::error::DlsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Decoded reply to a single command.
///
/// The device answers every request with exactly one line, which is either
/// a data frame, a boolean acknowledgement or an error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Data frame. A value of zero means success without data.
    Value(i32),
    /// Boolean/acknowledgement frame (`?` discriminator)
    Confirmed,
    /// Error frame, holding the negated device code (e.g. `-212`)
    Error(i32),
}

impl Response {
    /// Signed integer encoding: positive = data, zero = success, negative = error code.
    pub fn outcome(&self) -> i32 {
        match *self {
            Response::Value(v) => v,
            Response::Confirmed => 1,
            Response::Error(code) => code,
        }
    }

    /// Data carried by the frame, if any
    pub fn value(&self) -> Option<i32> {
        match *self {
            Response::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Negative device code of an error frame
    pub fn error_code(&self) -> Option<i32> {
        match *self {
            Response::Error(code) => Some(code),
            _ => None,
        }
    }

    /// Cause text for an error frame
    pub fn cause(&self) -> Option<&'static str> {
        self.error_code().map(codes::describe)
    }

    /// Data value scaled from tenths (0.1 mm distances, 0.1 °C temperatures)
    pub fn tenths(&self) -> Option<f64> {
        self.value().map(|v| v as f64 / 10.0)
    }
}

/// User gain expressed as a 7-bit fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainRatio {
    pub numerator: u8,
    pub denominator: u8,
}

impl GainRatio {
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Averaging filter configuration as stored by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Number of samples averaged per reading
    pub samples: u8,
    /// Maximum number of spikes removed
    pub spikes: u8,
    /// Maximum number of errors suppressed
    pub errors: u8,
}

impl FilterSettings {
    pub fn new(samples: u8, spikes: u8, errors: u8) -> Self {
        FilterSettings {
            samples,
            spikes,
            errors,
        }
    }

    /// Whether `2 * spikes + errors <= 0.4 * samples` holds
    pub fn is_valid(&self) -> bool {
        let rejected = 2.0 * self.spikes as f64 + self.errors as f64;
        rejected <= FILTER_REJECT_RATIO * self.samples as f64
    }
}

/// Requested filter change. Fields left as `None` keep the device's current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub samples: Option<u8>,
    pub spikes: Option<u8>,
    pub errors: Option<u8>,
}

impl FilterRequest {
    pub fn new(samples: Option<u8>, spikes: Option<u8>, errors: Option<u8>) -> Self {
        FilterRequest {
            samples,
            spikes,
            errors,
        }
    }

    pub fn samples(samples: u8) -> Self {
        FilterRequest {
            samples: Some(samples),
            ..Default::default()
        }
    }

    pub fn spikes(spikes: u8) -> Self {
        FilterRequest {
            spikes: Some(spikes),
            ..Default::default()
        }
    }

    pub fn errors(errors: u8) -> Self {
        FilterRequest {
            errors: Some(errors),
            ..Default::default()
        }
    }
}

/// Measuring characteristic presets.
///
/// | preset | class:subclass | accuracy / rate |
/// |---|---|---|
/// | normal | 0:0 | 1 mm / 10 Hz |
/// | fast | 0:1 | 2 mm / 20 Hz |
/// | precise | 0:2 | 0.8 mm / 6 Hz |
/// | natural | 0:3 | 5 mm / 0.25-6 Hz |
/// | timed | 1:1 | |
/// | movingerror | 2:0 | moving target, error freezing |
/// | movingnoerror | 2:1 | moving target, no error freezing |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasuringCharacteristic {
    Normal,
    Fast,
    Precise,
    Natural,
    Timed,
    MovingWithErrorFreeze,
    MovingWithoutErrorFreeze,
    /// Raw single-digit codes not covered by a preset
    Custom { class: u8, subclass: u8 },
}

impl MeasuringCharacteristic {
    /// `(class, subclass)` digits sent to the device
    pub fn codes(&self) -> (u8, u8) {
        match *self {
            MeasuringCharacteristic::Normal => (0, 0),
            MeasuringCharacteristic::Fast => (0, 1),
            MeasuringCharacteristic::Precise => (0, 2),
            MeasuringCharacteristic::Natural => (0, 3),
            MeasuringCharacteristic::Timed => (1, 1),
            MeasuringCharacteristic::MovingWithErrorFreeze => (2, 0),
            MeasuringCharacteristic::MovingWithoutErrorFreeze => (2, 1),
            MeasuringCharacteristic::Custom { class, subclass } => (class, subclass),
        }
    }
}

impl FromStr for MeasuringCharacteristic {
    type Err = DlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(MeasuringCharacteristic::Normal),
            "fast" => Ok(MeasuringCharacteristic::Fast),
            "precise" => Ok(MeasuringCharacteristic::Precise),
            "natural" => Ok(MeasuringCharacteristic::Natural),
            "timed" => Ok(MeasuringCharacteristic::Timed),
            "movingerror" => Ok(MeasuringCharacteristic::MovingWithErrorFreeze),
            "movingnoerror" => Ok(MeasuringCharacteristic::MovingWithoutErrorFreeze),
            _ => Err(DlsError::InvalidCharacteristic(s.to_string())),
        }
    }
}

/// Tracking mode as last observed from device outcomes.
///
/// Advisory only: the device decides whether a command is legal in its
/// current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    #[default]
    Idle,
    Tracking,
}

/// One reading taken while the device streams in tracking mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSample {
    pub timestamp: DateTime<Utc>,
    pub response: Response,
}

/// How the transport waits for response bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadMode {
    /// Poll in one-byte reads until the response deadline passes
    #[default]
    NonBlocking,
    /// Keep waiting for each byte until the line is complete
    Blocking,
}

/// Session and serial port configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Per-read timeout in deciseconds
    pub read_timeout_deciseconds: u8,
    pub read_mode: ReadMode,
    /// Upper bound on the wait for one response line in non-blocking mode
    pub response_deadline: Duration,
    /// Device address, the `N` in `sN` request prefixes
    pub device_id: u8,
    pub user_calibrated: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            port: DEFAULT_PORT.to_string(),
            baud_rate: BAUD_RATE,
            read_timeout_deciseconds: DEFAULT_TIMEOUT_DECISECONDS,
            read_mode: ReadMode::NonBlocking,
            response_deadline: DEFAULT_RESPONSE_DEADLINE,
            device_id: DEFAULT_DEVICE_ID,
            user_calibrated: false,
        }
    }
}

impl SessionConfig {
    pub fn new(port: &str) -> Self {
        SessionConfig {
            port: port.to_string(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: &str) -> Self {
        self.port = port.to_string();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout_deciseconds(mut self, deciseconds: u8) -> Self {
        self.read_timeout_deciseconds = deciseconds;
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_response_deadline(mut self, deadline: Duration) -> Self {
        self.response_deadline = deadline;
        self
    }

    pub fn with_device_id(mut self, device_id: u8) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_user_calibrated(mut self, enabled: bool) -> Self {
        self.user_calibrated = enabled;
        self
    }

    /// Reject settings the wire format cannot carry.
    ///
    /// Replies are decoded at fixed columns, so a two digit address would
    /// shift every field.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.device_id > MAX_DEVICE_ID {
            return Err(DlsError::InvalidDeviceId(self.device_id));
        }
        Ok(())
    }

    /// Per-read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.read_timeout_deciseconds) * 100)
    }
}
