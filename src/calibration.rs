//! Calibration parameter computation.
//!
//! The rangefinder stores the user gain as a fraction of two 7-bit integers
//! and rejects averaging filter settings that would discard too many
//! samples. Both are resolved here before anything is sent to the device.

use crate::constants::*;
use crate::types::{FilterRequest, FilterSettings, GainRatio};
use log::{debug, error, warn};

/// Best fraction `n/d` with `n` in `0..=127` and `d` in `1..=127` for `gain`.
///
/// Scans numerators ascending, then denominators ascending, seeded with
/// `0/1`. A candidate replaces the current best only when strictly closer,
/// so the first pair found wins ties. Negative gains are taken by
/// magnitude and anything above 127 saturates to `127/1`.
pub fn best_gain_ratio(gain: f64) -> GainRatio {
    let gain = gain.abs().clamp(0.0, GAIN_LIMIT as f64);
    let mut best = GainRatio {
        numerator: 0,
        denominator: 1,
    };
    let mut best_error = (best.value() - gain).abs();

    for numerator in 0..=GAIN_LIMIT {
        for denominator in 1..=GAIN_LIMIT {
            let error = (numerator as f64 / denominator as f64 - gain).abs();
            if error < best_error {
                best_error = error;
                best = GainRatio {
                    numerator,
                    denominator,
                };
            }
        }
    }

    debug!(
        "gain {} -> {}/{} (error {:e})",
        gain, best.numerator, best.denominator, best_error
    );
    best
}

/// Outcome of resolving a filter request against the device's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterResolution {
    /// Settings to send to the device
    pub settings: FilterSettings,
    /// `samples` was moved into the supported range
    pub clamped: bool,
    /// The request violated the rejection constraint and was discarded
    pub reverted: bool,
}

/// Combine a filter request with the device's current settings.
///
/// Missing fields take the current value, `samples` is clamped into
/// `1..=32`, and a result violating `2 * spikes + errors <= 0.4 * samples`
/// is discarded wholesale in favour of `current`.
pub fn resolve_filter(request: FilterRequest, current: FilterSettings) -> FilterResolution {
    let requested_samples = request.samples.unwrap_or(current.samples);
    let samples = requested_samples.clamp(FILTER_MIN_SAMPLES, FILTER_MAX_SAMPLES);
    let clamped = samples != requested_samples;
    if clamped {
        warn!(
            "average of {} samples not supported, using {}",
            requested_samples, samples
        );
    }

    let candidate = FilterSettings {
        samples,
        spikes: request.spikes.unwrap_or(current.spikes),
        errors: request.errors.unwrap_or(current.errors),
    };
    debug!(
        "filter samples {} spikes {} errors {}",
        candidate.samples, candidate.spikes, candidate.errors
    );

    if candidate.is_valid() {
        return FilterResolution {
            settings: candidate,
            clamped,
            reverted: false,
        };
    }

    error!(
        "(2*spikes + errors) must not exceed 0.4*samples: {}/{}/{} rejected, keeping {}/{}/{}",
        candidate.samples,
        candidate.spikes,
        candidate.errors,
        current.samples,
        current.spikes,
        current.errors
    );
    FilterResolution {
        settings: current,
        clamped,
        reverted: true,
    }
}
