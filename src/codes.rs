//! Error codes reported by the rangefinder.
//!
//! Error frames carry a three digit code which the decoder negates. This
//! module maps those negative codes to the fault they stand for.

use serde::{Deserialize, Serialize};

/// Text returned for codes outside the known catalog
pub const UNKNOWN_CAUSE: &str = "Unknown error code";

/// Faults the rangefinder can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFault {
    InvalidSyntax,
    NotTracking,
    SamplingTooFast,
    TrackingActive,
    Communication,
    DistanceOverflow,
    DigitalInputMode,
    DigitalOutputIsInput,
    NotDisplayable,
    DistanceOutOfRange,
    DigitalOutputManualMode,
    TemperatureTooHigh,
    TemperatureTooLow,
    BadSignal,
    SignalTooWeak,
    SignalTooStrong,
    SupplyVoltageTooHigh,
    SupplyVoltageTooLow,
    AmbiguousTargets,
    TooMuchLight,
    TooMuchLightReflective,
    TargetAcceleration,
    TargetOverSpeed,
    MeasuringTimeTooShort,
    MeasuringTimeTooLong,
}

/// Every known fault, in code order
pub const ALL_FAULTS: [DeviceFault; 25] = [
    DeviceFault::InvalidSyntax,
    DeviceFault::NotTracking,
    DeviceFault::SamplingTooFast,
    DeviceFault::TrackingActive,
    DeviceFault::Communication,
    DeviceFault::DistanceOverflow,
    DeviceFault::DigitalInputMode,
    DeviceFault::DigitalOutputIsInput,
    DeviceFault::NotDisplayable,
    DeviceFault::DistanceOutOfRange,
    DeviceFault::DigitalOutputManualMode,
    DeviceFault::TemperatureTooHigh,
    DeviceFault::TemperatureTooLow,
    DeviceFault::BadSignal,
    DeviceFault::SignalTooWeak,
    DeviceFault::SignalTooStrong,
    DeviceFault::SupplyVoltageTooHigh,
    DeviceFault::SupplyVoltageTooLow,
    DeviceFault::AmbiguousTargets,
    DeviceFault::TooMuchLight,
    DeviceFault::TooMuchLightReflective,
    DeviceFault::TargetAcceleration,
    DeviceFault::TargetOverSpeed,
    DeviceFault::MeasuringTimeTooShort,
    DeviceFault::MeasuringTimeTooLong,
];

impl DeviceFault {
    /// Look up the fault for a negative outcome code
    pub fn from_code(code: i32) -> Option<Self> {
        let fault = match code {
            -203 => DeviceFault::InvalidSyntax,
            -210 => DeviceFault::NotTracking,
            -211 => DeviceFault::SamplingTooFast,
            -212 => DeviceFault::TrackingActive,
            -220 => DeviceFault::Communication,
            -230 => DeviceFault::DistanceOverflow,
            -231 => DeviceFault::DigitalInputMode,
            -232 => DeviceFault::DigitalOutputIsInput,
            -233 => DeviceFault::NotDisplayable,
            -234 => DeviceFault::DistanceOutOfRange,
            -236 => DeviceFault::DigitalOutputManualMode,
            -252 => DeviceFault::TemperatureTooHigh,
            -253 => DeviceFault::TemperatureTooLow,
            -254 => DeviceFault::BadSignal,
            -255 => DeviceFault::SignalTooWeak,
            -256 => DeviceFault::SignalTooStrong,
            -258 => DeviceFault::SupplyVoltageTooHigh,
            -259 => DeviceFault::SupplyVoltageTooLow,
            -260 => DeviceFault::AmbiguousTargets,
            -263 => DeviceFault::TooMuchLight,
            -264 => DeviceFault::TooMuchLightReflective,
            -330 => DeviceFault::TargetAcceleration,
            -331 => DeviceFault::TargetOverSpeed,
            -360 => DeviceFault::MeasuringTimeTooShort,
            -361 => DeviceFault::MeasuringTimeTooLong,
            _ => return None,
        };
        Some(fault)
    }

    /// Negative outcome code of this fault
    pub fn code(&self) -> i32 {
        match self {
            DeviceFault::InvalidSyntax => -203,
            DeviceFault::NotTracking => -210,
            DeviceFault::SamplingTooFast => -211,
            DeviceFault::TrackingActive => -212,
            DeviceFault::Communication => -220,
            DeviceFault::DistanceOverflow => -230,
            DeviceFault::DigitalInputMode => -231,
            DeviceFault::DigitalOutputIsInput => -232,
            DeviceFault::NotDisplayable => -233,
            DeviceFault::DistanceOutOfRange => -234,
            DeviceFault::DigitalOutputManualMode => -236,
            DeviceFault::TemperatureTooHigh => -252,
            DeviceFault::TemperatureTooLow => -253,
            DeviceFault::BadSignal => -254,
            DeviceFault::SignalTooWeak => -255,
            DeviceFault::SignalTooStrong => -256,
            DeviceFault::SupplyVoltageTooHigh => -258,
            DeviceFault::SupplyVoltageTooLow => -259,
            DeviceFault::AmbiguousTargets => -260,
            DeviceFault::TooMuchLight => -263,
            DeviceFault::TooMuchLightReflective => -264,
            DeviceFault::TargetAcceleration => -330,
            DeviceFault::TargetOverSpeed => -331,
            DeviceFault::MeasuringTimeTooShort => -360,
            DeviceFault::MeasuringTimeTooLong => -361,
        }
    }

    pub fn cause(&self) -> &'static str {
        match self {
            DeviceFault::InvalidSyntax => {
                "Wrong syntax in command, prohibited parameter in command entry or non-valid result"
            }
            DeviceFault::NotTracking => "Not in tracking mode, start tracking mode first",
            DeviceFault::SamplingTooFast => {
                "Sampling too fast, set the sampling time to a larger value"
            }
            DeviceFault::TrackingActive => {
                "Command cannot be executed because tracking mode is active, first use command sNc to stop tracking mode"
            }
            DeviceFault::Communication => "Communication error, check configuration settings",
            DeviceFault::DistanceOverflow => {
                "Distance value overflow caused by wrong user configuration. Change user offset (and/or user gain)"
            }
            DeviceFault::DigitalInputMode => {
                "Wrong mode for digital input status read, activate DI1"
            }
            DeviceFault::DigitalOutputIsInput => {
                "Digital output 1 cannot be set if configured as digital input"
            }
            DeviceFault::NotDisplayable => "Number cannot be displayed (check output format)",
            DeviceFault::DistanceOutOfRange => "Distance out of range",
            DeviceFault::DigitalOutputManualMode => {
                "Digital output manual mode cannot be activated when configured as digital input"
            }
            DeviceFault::TemperatureTooHigh => "Temperature too high (contact Dimetix)",
            DeviceFault::TemperatureTooLow => "Temperature too low (contact Dimetix)",
            DeviceFault::BadSignal => {
                "Bad signal from target, it takes too long to measure the distance. Use a white surface or reflective target"
            }
            DeviceFault::SignalTooWeak => {
                "Received signal too weak or target lost in moving target characteristic (use different target and distances)"
            }
            DeviceFault::SignalTooStrong => {
                "Received signal too strong (use different target and distances)"
            }
            DeviceFault::SupplyVoltageTooHigh => "Power supply voltage is too high",
            DeviceFault::SupplyVoltageTooLow => "Power supply voltage is too low",
            DeviceFault::AmbiguousTargets => {
                "Distance cannot be calculated because of ambiguous targets"
            }
            DeviceFault::TooMuchLight => {
                "Too much light, use only a Dimetix reflective target plate. In moving target characteristic, distance jump occurred"
            }
            DeviceFault::TooMuchLightReflective => {
                "Too much light, measuring on reflective targets not possible"
            }
            DeviceFault::TargetAcceleration => {
                "Acceleration of target too strong or distance jump (moving target characteristic only)"
            }
            DeviceFault::TargetOverSpeed => "Over speed of target",
            DeviceFault::MeasuringTimeTooShort => {
                "Configured measuring time is too short, set a longer time or use 0"
            }
            DeviceFault::MeasuringTimeTooLong => {
                "Configured measuring time is too long, set a shorter time"
            }
        }
    }
}

/// Cause text for a negative outcome code. Unlisted codes map to [`UNKNOWN_CAUSE`].
pub fn describe(code: i32) -> &'static str {
    DeviceFault::from_code(code)
        .map(|fault| fault.cause())
        .unwrap_or(UNKNOWN_CAUSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tracking_conflict_is_described() {
        assert_eq!(DeviceFault::from_code(-212), Some(DeviceFault::TrackingActive));
        assert!(describe(-212).contains("tracking mode is active"));
        assert!(describe(-210).starts_with("Not in tracking mode"));
    }

    #[test]
    fn unlisted_codes_are_unknown() {
        assert_eq!(describe(-999), UNKNOWN_CAUSE);
        assert_eq!(describe(-204), UNKNOWN_CAUSE);
        assert_eq!(describe(212), UNKNOWN_CAUSE);
        assert_eq!(DeviceFault::from_code(-999), None);
    }

    #[test]
    fn catalog_round_trips_through_codes() {
        let mut codes = HashSet::new();
        for fault in ALL_FAULTS {
            assert_eq!(DeviceFault::from_code(fault.code()), Some(fault));
            assert_ne!(fault.cause(), UNKNOWN_CAUSE);
            assert!(codes.insert(fault.code()), "duplicate code {}", fault.code());
        }
    }
}
