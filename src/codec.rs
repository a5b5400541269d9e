//! Frame encoding and decoding for the rangefinder's ASCII line protocol.
//!
//! Requests have the form `sN<mnemonic>[+param...]\r\n` where `N` is the
//! device address. Replies echo the address as `gN...` and are classified by
//! their third character: `@` marks an error frame, `?` a boolean frame, and
//! anything else a data frame with an eight digit field at a fixed column.

use crate::constants::*;
use crate::error::{DlsError, Result};
use crate::types::{FilterSettings, GainRatio, MeasuringCharacteristic, Response};

/// Requests understood by the rangefinder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Single distance measurement (`sNg`)
    Measure,
    /// Single distance measurement with user offset/gain applied (`sNug`)
    MeasureUserCalibrated,
    /// Enter tracking mode at the maximum rate (`sNh`)
    StartTracking,
    /// Enter tracking mode with a delay in 10 ms ticks (`sNh+ddd`)
    StartTrackingDelayed(u16),
    /// Leave tracking mode (`sNc`)
    StopTracking,
    ReadTemperature,
    SignalQuality,
    LaserOn,
    LaserOff,
    /// Persist the current configuration (`sNs`)
    SaveConfiguration,
    /// User offset in 0.1 mm (`sNuof+oooooooo`)
    SetOffset(i32),
    /// User gain fraction (`sNuga+nnnnnnnn+dddddddd`)
    SetGain(GainRatio),
    SetMeasuringCharacteristic(MeasuringCharacteristic),
    /// Query the averaging filter (`sNfi`)
    QueryOutputFilter,
    /// Configure the averaging filter (`sNfi+aa+bb+cc`)
    SetOutputFilter(FilterSettings),
}

impl Command {
    /// Short code identifying the operation on the wire
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::Measure => "g",
            Command::MeasureUserCalibrated => "ug",
            Command::StartTracking | Command::StartTrackingDelayed(_) => "h",
            Command::StopTracking => "c",
            Command::ReadTemperature => "t",
            Command::SignalQuality => "m",
            Command::LaserOn => "o",
            Command::LaserOff => "p",
            Command::SaveConfiguration => "s",
            Command::SetOffset(_) => "uof",
            Command::SetGain(_) => "uga",
            Command::SetMeasuringCharacteristic(_) => "uc",
            Command::QueryOutputFilter | Command::SetOutputFilter(_) => "fi",
        }
    }

    /// Complete request line, terminator included
    pub fn encode(&self, device_id: u8) -> String {
        let params = match *self {
            Command::StartTrackingDelayed(ticks) => format!("+{:03}", ticks),
            Command::SignalQuality => "+0".to_string(),
            Command::SetOffset(offset) => format!("+{:08}", offset),
            Command::SetGain(gain) => {
                format!("+{:08}+{:08}", gain.numerator, gain.denominator)
            }
            Command::SetMeasuringCharacteristic(characteristic) => {
                let (class, subclass) = characteristic.codes();
                format!("+{:1}+{:1}", class, subclass)
            }
            Command::SetOutputFilter(filter) => format!(
                "+{:02}+{:02}+{:02}",
                filter.samples, filter.spikes, filter.errors
            ),
            _ => String::new(),
        };
        format!("s{}{}{}\r\n", device_id, self.mnemonic(), params)
    }
}

/// Reply to an output filter query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReply {
    Settings(FilterSettings),
    /// Negated device error code
    Error(i32),
}

/// Decode a response line.
///
/// `user_calibrated` shifts the data field right by one column, matching the
/// extra character the device inserts in that mode. The sign sits in the
/// column just before the field. Bytes past the terminator are ignored.
pub fn decode(line: &[u8], user_calibrated: bool) -> Result<Response> {
    let line = trim_line(line);
    let discriminator = discriminator(line)?;

    if discriminator == ERROR_MARKER {
        return Ok(Response::Error(error_code(line)?));
    }
    if discriminator == BOOLEAN_MARKER {
        return Ok(Response::Confirmed);
    }

    let offset = if user_calibrated {
        DATA_FIELD_OFFSET + USER_CALIBRATED_SHIFT
    } else {
        DATA_FIELD_OFFSET
    };
    let value = parse_field(field(line, offset, DATA_FIELD_WIDTH));
    match line.get(offset - 1) {
        Some(b'-') => Ok(Response::Value(-value)),
        _ => Ok(Response::Value(value)),
    }
}

/// Decode the reply to [`Command::QueryOutputFilter`] (`gNfi+aa+bb+cc`)
pub fn decode_filter(line: &[u8]) -> Result<FilterReply> {
    let line = trim_line(line);
    if discriminator(line)? == ERROR_MARKER {
        return Ok(FilterReply::Error(error_code(line)?));
    }

    let [samples, spikes, errors] = FILTER_FIELD_OFFSETS
        .map(|offset| parse_field(field(line, offset, FILTER_FIELD_WIDTH)));
    let to_u8 = |value: i32| {
        u8::try_from(value).map_err(|_| {
            DlsError::Parse(format!(
                "filter field {} out of range in {:?}",
                value,
                String::from_utf8_lossy(line)
            ))
        })
    };
    Ok(FilterReply::Settings(FilterSettings::new(
        to_u8(samples)?,
        to_u8(spikes)?,
        to_u8(errors)?,
    )))
}

/// Cut the line at its first `\r\n`
fn trim_line(line: &[u8]) -> &[u8] {
    line.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map_or(line, |end| &line[..end])
}

fn discriminator(line: &[u8]) -> Result<u8> {
    line.get(DISCRIMINATOR_INDEX).copied().ok_or_else(|| DlsError::InvalidResponse {
        expected: "gN<kind>...".to_string(),
        actual: String::from_utf8_lossy(line).escape_default().to_string(),
    })
}

/// Negated error code; an error frame without a code cannot be classified
fn error_code(line: &[u8]) -> Result<i32> {
    match parse_field(field(line, ERROR_CODE_OFFSET, ERROR_CODE_WIDTH)).abs() {
        0 => Err(DlsError::InvalidResponse {
            expected: "gN@Ecode".to_string(),
            actual: String::from_utf8_lossy(line).escape_default().to_string(),
        }),
        code => Ok(-code),
    }
}

/// Up to `width` bytes starting at `offset`; empty when the line is shorter
fn field(line: &[u8], offset: usize, width: usize) -> &[u8] {
    let start = offset.min(line.len());
    let end = (offset + width).min(line.len());
    &line[start..end]
}

/// Lenient decimal parse: leading spaces, optional sign, digits up to the
/// first non-digit. No digits yields 0.
fn parse_field(field: &[u8]) -> i32 {
    let mut bytes = field.iter().copied().skip_while(|b| *b == b' ').peekable();
    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let magnitude = bytes
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| acc * 10 + i64::from(digit - b'0'));
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_plain_commands() {
        assert_eq!(Command::Measure.encode(0), "s0g\r\n");
        assert_eq!(Command::MeasureUserCalibrated.encode(0), "s0ug\r\n");
        assert_eq!(Command::StartTracking.encode(0), "s0h\r\n");
        assert_eq!(Command::StopTracking.encode(0), "s0c\r\n");
        assert_eq!(Command::ReadTemperature.encode(0), "s0t\r\n");
        assert_eq!(Command::SignalQuality.encode(0), "s0m+0\r\n");
        assert_eq!(Command::LaserOn.encode(0), "s0o\r\n");
        assert_eq!(Command::LaserOff.encode(0), "s0p\r\n");
        assert_eq!(Command::SaveConfiguration.encode(0), "s0s\r\n");
        assert_eq!(Command::QueryOutputFilter.encode(0), "s0fi\r\n");
    }

    #[test]
    fn encodes_fixed_width_parameters() {
        assert_eq!(Command::StartTrackingDelayed(5).encode(0), "s0h+005\r\n");
        assert_eq!(Command::SetOffset(1234).encode(0), "s0uof+00001234\r\n");
        assert_eq!(Command::SetOffset(-25).encode(0), "s0uof+-0000025\r\n");
        assert_eq!(
            Command::SetGain(GainRatio {
                numerator: 1,
                denominator: 10
            })
            .encode(0),
            "s0uga+00000001+00000010\r\n"
        );
        assert_eq!(
            Command::SetMeasuringCharacteristic(MeasuringCharacteristic::MovingWithoutErrorFreeze)
                .encode(0),
            "s0uc+2+1\r\n"
        );
        assert_eq!(
            Command::SetOutputFilter(FilterSettings::new(8, 1, 1)).encode(0),
            "s0fi+08+01+01\r\n"
        );
    }

    #[test]
    fn device_id_prefixes_every_request() {
        assert_eq!(Command::Measure.encode(3), "s3g\r\n");
        assert_eq!(Command::SetOffset(1).encode(7), "s7uof+00000001\r\n");
    }

    #[test]
    fn decodes_error_frame() {
        assert_eq!(decode(b"g0@E212\r\n", false).unwrap(), Response::Error(-212));
        assert_eq!(decode(b"g0@E255\r\n", true).unwrap(), Response::Error(-255));
    }

    #[test]
    fn decodes_boolean_frame() {
        assert_eq!(decode(b"g0?\r\n", false).unwrap(), Response::Confirmed);
    }

    #[test]
    fn decodes_data_field_at_calibration_dependent_column() {
        assert_eq!(decode(b"g0g+00012345\r\n", false).unwrap(), Response::Value(12345));
        assert_eq!(decode(b"g0ug+00012345\r\n", true).unwrap(), Response::Value(12345));

        // Reading at the wrong column shifts the field by one character
        assert_eq!(decode(b"g0g+12345678\r\n", false).unwrap(), Response::Value(12345678));
        assert_eq!(decode(b"g0g+12345678\r\n", true).unwrap(), Response::Value(2345678));
        assert_eq!(decode(b"g0ug+12345678\r\n", false).unwrap(), Response::Value(1234567));
    }

    #[test]
    fn decodes_sign_before_data_field() {
        assert_eq!(decode(b"g0g-00000025\r\n", false).unwrap(), Response::Value(-25));
        assert_eq!(decode(b"g0ug-00000025\r\n", true).unwrap(), Response::Value(-25));
        assert_eq!(decode(b"g0t-00000123\r\n", false).unwrap(), Response::Value(-123));
        assert_eq!(decode(b"g0ug+00000025\r\n", true).unwrap(), Response::Value(25));
    }

    #[test]
    fn data_frame_without_digits_is_success() {
        assert_eq!(decode(b"g0o\r\n", false).unwrap(), Response::Value(0));
        assert_eq!(decode(b"g0s\r\n", false).unwrap(), Response::Value(0));
    }

    #[test]
    fn tolerates_trailing_garbage() {
        assert_eq!(
            decode(b"g0t+00000234\r\n\x00\xffjunk", false).unwrap(),
            Response::Value(234)
        );
        assert_eq!(
            decode(b"g0g+00000042\r\ng0g+00000099\r\n", false).unwrap(),
            Response::Value(42)
        );
    }

    #[test]
    fn tolerates_partial_lines() {
        assert_eq!(decode(b"g0g+0001", false).unwrap(), Response::Value(1));
        assert!(matches!(
            decode(b"g0@", false),
            Err(DlsError::InvalidResponse { .. })
        ));
        assert!(matches!(
            decode(b"g0", false),
            Err(DlsError::InvalidResponse { .. })
        ));
        assert!(decode(b"", true).is_err());
    }

    #[test]
    fn parses_signed_fields() {
        assert_eq!(parse_field(b"-0000025"), -25);
        assert_eq!(parse_field(b"+12"), 12);
        assert_eq!(parse_field(b"  42xyz"), 42);
        assert_eq!(parse_field(b"xx"), 0);
        assert_eq!(parse_field(b""), 0);
    }

    #[test]
    fn reply_frames_carry_value_for_every_command() {
        let commands = [
            Command::Measure,
            Command::MeasureUserCalibrated,
            Command::StartTracking,
            Command::StartTrackingDelayed(10),
            Command::StopTracking,
            Command::ReadTemperature,
            Command::SignalQuality,
            Command::LaserOn,
            Command::LaserOff,
            Command::SaveConfiguration,
            Command::SetOffset(-3),
            Command::SetGain(GainRatio {
                numerator: 3,
                denominator: 4,
            }),
            Command::SetMeasuringCharacteristic(MeasuringCharacteristic::Fast),
            Command::QueryOutputFilter,
            Command::SetOutputFilter(FilterSettings::new(8, 1, 1)),
        ];
        for (i, command) in commands.iter().enumerate() {
            let request = command.encode(0);
            assert!(request.starts_with(&format!("s0{}", command.mnemonic())));
            assert!(request.ends_with("\r\n"));

            let kind = command.mnemonic().chars().last().unwrap_or('g');
            let magnitude = 1_000_003 * (i as i32 + 1);
            for user_calibrated in [false, true] {
                let flag = if user_calibrated { "u" } else { "" };
                for (sign, value) in [('+', magnitude), ('-', -magnitude)] {
                    let reply = format!("g0{}{}{}{:08}\r\n", flag, kind, sign, magnitude);
                    assert_eq!(
                        decode(reply.as_bytes(), user_calibrated).unwrap(),
                        Response::Value(value),
                        "{:?} {}",
                        command,
                        reply.escape_default()
                    );
                }
            }
        }
    }

    #[test]
    fn decodes_filter_reply() {
        assert_eq!(
            decode_filter(b"g0fi+10+01+02\r\n").unwrap(),
            FilterReply::Settings(FilterSettings::new(10, 1, 2))
        );
        assert_eq!(
            decode_filter(b"g0@E212\r\n").unwrap(),
            FilterReply::Error(-212)
        );
        assert!(matches!(
            decode_filter(b"g0fi+10+-1+02\r\n"),
            Err(DlsError::Parse(_))
        ));
    }
}
