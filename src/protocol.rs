use crate::calibration::{best_gain_ratio, resolve_filter};
use crate::codec::{self, Command, FilterReply};
use crate::codes::{self, DeviceFault};
use crate::constants::*;
use crate::error::Result;
use crate::transport::{SerialTransport, Transport};
use crate::types::*;
use chrono::Utc;
use log::{debug, error, warn};
use std::time::Duration;

/// Main rangefinder protocol interface.
///
/// Every operation writes one request line and waits for its response line
/// before returning. Device errors are logged with their cause and returned
/// as [`Response::Error`]; only transport failures surface as `Err`.
pub struct Dls<T: Transport = SerialTransport> {
    transport: T,
    device_id: u8,
    user_calibrated: bool,
    tracking: TrackingState,
}

impl Dls<SerialTransport> {
    /// Open a rangefinder on `port_name` with default settings
    pub fn open(port_name: &str) -> Result<Self> {
        Self::with_config(&SessionConfig::new(port_name))
    }

    /// Open a rangefinder using `config`
    pub fn with_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let transport = SerialTransport::open(config)?;
        Self::with_transport(transport, config)
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }

    /// Switch to another serial device and make sure it is not tracking
    pub fn reopen(&mut self, port_name: &str) -> Result<Response> {
        let config = self.transport.config().clone().with_port(port_name);
        self.reconfigure(&config)?;
        self.force_tracking_off()
    }

    /// Re-apply port settings, device address and calibration flag
    pub fn reconfigure(&mut self, config: &SessionConfig) -> Result<()> {
        config.validate()?;
        self.transport.reconfigure(config)?;
        self.device_id = config.device_id;
        self.user_calibrated = config.user_calibrated;
        Ok(())
    }
}

impl<T: Transport> Dls<T> {
    /// Wrap an already configured transport, device address 0
    pub fn new(transport: T) -> Self {
        Dls {
            transport,
            device_id: DEFAULT_DEVICE_ID,
            user_calibrated: false,
            tracking: TrackingState::Idle,
        }
    }

    /// Wrap a transport, taking device address and calibration flag from `config`
    pub fn with_transport(transport: T, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Dls {
            transport,
            device_id: config.device_id,
            user_calibrated: config.user_calibrated,
            tracking: TrackingState::Idle,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    /// Select user-calibrated measurements.
    ///
    /// Changes both the measure command and the column data is read from.
    pub fn set_user_calibrated(&mut self, enabled: bool) {
        self.user_calibrated = enabled;
    }

    pub fn user_calibrated(&self) -> bool {
        self.user_calibrated
    }

    /// Tracking mode as last confirmed by the device
    pub fn tracking_state(&self) -> TrackingState {
        self.tracking
    }

    /// Write `command` and decode its reply without reporting errors
    fn request(&mut self, command: Command) -> Result<Response> {
        let line = command.encode(self.device_id);
        self.transport.write_line(line.as_bytes())?;
        self.receive()
    }

    fn receive(&mut self) -> Result<Response> {
        let line = self.transport.read_line()?;
        let response = codec::decode(&line, self.user_calibrated)?;
        self.observe(response);
        Ok(response)
    }

    /// Write `command`, decode its reply and report device errors
    fn transact(&mut self, command: Command) -> Result<Response> {
        let response = self.request(command)?;
        Self::report(response);
        Ok(response)
    }

    fn report(response: Response) {
        if let Response::Error(code) = response {
            error!("ERROR {}: {}", code, codes::describe(code));
        }
    }

    /// Follow mode changes the device tells us about
    fn observe(&mut self, response: Response) {
        match response.error_code().and_then(DeviceFault::from_code) {
            Some(DeviceFault::NotTracking) => self.tracking = TrackingState::Idle,
            Some(DeviceFault::TrackingActive) => self.tracking = TrackingState::Tracking,
            _ => {}
        }
    }

    /// Save the configuration after a set command.
    ///
    /// The save is always sent; the set command's reply wins if it failed.
    fn persist(&mut self, response: Response) -> Result<Response> {
        let saved = self.save_configuration()?;
        Ok(if response.is_error() { response } else { saved })
    }

    /// Single distance measurement in 0.1 mm
    pub fn measure_once(&mut self) -> Result<Response> {
        let command = if self.user_calibrated {
            Command::MeasureUserCalibrated
        } else {
            Command::Measure
        };
        self.transact(command)
    }

    /// Enter tracking mode at the maximum sampling rate
    pub fn start_tracking(&mut self) -> Result<Response> {
        let response = self.transact(Command::StartTracking)?;
        if !response.is_error() {
            self.tracking = TrackingState::Tracking;
        }
        Ok(response)
    }

    /// Enter tracking mode with `delay` between samples (10 ms resolution)
    pub fn start_tracking_delayed(&mut self, delay: Duration) -> Result<Response> {
        let ticks = tracking_delay_ticks(delay);
        let applied = TRACKING_TICK * u32::from(ticks);
        if applied != delay {
            warn!(
                "tracking delay {:?} not a multiple of {:?} up to {:?}, using {:?}",
                delay,
                TRACKING_TICK,
                TRACKING_TICK * u32::from(MAX_TRACKING_DELAY_TICKS),
                applied
            );
        }

        let response = self.transact(Command::StartTrackingDelayed(ticks))?;
        if !response.is_error() {
            self.tracking = TrackingState::Tracking;
        }
        Ok(response)
    }

    /// Leave tracking mode
    pub fn stop_tracking(&mut self) -> Result<Response> {
        let response = self.transact(Command::StopTracking)?;
        if !response.is_error() {
            self.tracking = TrackingState::Idle;
        }
        Ok(response)
    }

    /// Stop tracking, treating "not in tracking mode" as success
    fn force_tracking_off(&mut self) -> Result<Response> {
        let response = self.request(Command::StopTracking)?;
        match response.error_code().and_then(DeviceFault::from_code) {
            Some(DeviceFault::NotTracking) => debug!("device was not tracking"),
            _ => Self::report(response),
        }
        if !response.is_error() {
            self.tracking = TrackingState::Idle;
        }
        Ok(response)
    }

    /// Read the next sample streamed in tracking mode (no request is written)
    pub fn poll_tracking_sample(&mut self) -> Result<Response> {
        if self.tracking == TrackingState::Idle {
            debug!("polling for a tracking sample while tracking is not confirmed");
        }
        let response = self.receive()?;
        Self::report(response);
        Ok(response)
    }

    /// Stream distance samples until `should_stop` returns true.
    ///
    /// Tracking is forced off first, then started (with `delay` between
    /// samples when given). `should_stop` is checked before every read, so
    /// cancellation takes effect within one sample. Tracking is stopped on
    /// exit, also when a read fails. Returns the stop command's reply, or the
    /// start command's reply when the device refused to start.
    pub fn track<S, F>(
        &mut self,
        delay: Option<Duration>,
        mut should_stop: S,
        mut on_sample: F,
    ) -> Result<Response>
    where
        S: FnMut() -> bool,
        F: FnMut(&TrackingSample),
    {
        self.force_tracking_off()?;
        let started = match delay {
            Some(delay) => self.start_tracking_delayed(delay)?,
            None => self.start_tracking()?,
        };
        if started.is_error() {
            return Ok(started);
        }

        let streamed = self.stream(&mut should_stop, &mut on_sample);
        let stopped = self.stop_tracking();
        streamed?;
        stopped
    }

    fn stream<S, F>(&mut self, should_stop: &mut S, on_sample: &mut F) -> Result<()>
    where
        S: FnMut() -> bool,
        F: FnMut(&TrackingSample),
    {
        while !should_stop() {
            let response = self.poll_tracking_sample()?;
            on_sample(&TrackingSample {
                timestamp: Utc::now(),
                response,
            });
        }
        Ok(())
    }

    /// Internal temperature in 0.1 °C
    pub fn read_temperature(&mut self) -> Result<Response> {
        self.transact(Command::ReadTemperature)
    }

    /// Relative signal strength, 0 to about 40 million
    pub fn signal_quality(&mut self) -> Result<Response> {
        self.transact(Command::SignalQuality)
    }

    pub fn laser_on(&mut self) -> Result<Response> {
        self.transact(Command::LaserOn)
    }

    pub fn laser_off(&mut self) -> Result<Response> {
        self.transact(Command::LaserOff)
    }

    /// Persist the device configuration
    pub fn save_configuration(&mut self) -> Result<Response> {
        self.transact(Command::SaveConfiguration)
    }

    /// Set the user calibration offset (0.1 mm) and save it
    pub fn set_offset(&mut self, offset: i32) -> Result<Response> {
        let response = self.transact(Command::SetOffset(offset))?;
        self.persist(response)
    }

    /// Set the user calibration gain and save it.
    ///
    /// The device stores the gain as a 7-bit fraction; the closest one is used.
    pub fn set_gain(&mut self, gain: f64) -> Result<Response> {
        let ratio = best_gain_ratio(gain);
        debug!(
            "gain {} encoded as {}/{}",
            gain, ratio.numerator, ratio.denominator
        );
        let response = self.transact(Command::SetGain(ratio))?;
        self.persist(response)
    }

    /// Select the measuring characteristic and save it
    pub fn set_measuring_characteristic(
        &mut self,
        characteristic: MeasuringCharacteristic,
    ) -> Result<Response> {
        let response = self.transact(Command::SetMeasuringCharacteristic(characteristic))?;
        self.persist(response)
    }

    /// Current averaging filter settings
    pub fn output_filter(&mut self) -> Result<FilterReply> {
        let line = Command::QueryOutputFilter.encode(self.device_id);
        self.transport.write_line(line.as_bytes())?;
        let reply = codec::decode_filter(&self.transport.read_line()?)?;
        if let FilterReply::Error(code) = reply {
            let response = Response::Error(code);
            self.observe(response);
            Self::report(response);
        }
        Ok(reply)
    }

    /// Change the averaging filter and save it.
    ///
    /// Unset fields keep the device's current value. A combination violating
    /// `2 * spikes + errors <= 0.4 * samples` is never sent: the current
    /// settings are written back instead.
    pub fn set_output_filter(&mut self, request: FilterRequest) -> Result<Response> {
        let current = match self.output_filter()? {
            FilterReply::Settings(settings) => settings,
            FilterReply::Error(code) => return Ok(Response::Error(code)),
        };

        let resolution = resolve_filter(request, current);
        let response = self.transact(Command::SetOutputFilter(resolution.settings))?;
        self.persist(response)
    }
}

/// Whole 10 ms ticks in `delay`, rounded down and capped at three digits
fn tracking_delay_ticks(delay: Duration) -> u16 {
    let ticks = delay.as_millis() / TRACKING_TICK.as_millis();
    u16::try_from(ticks)
        .unwrap_or(u16::MAX)
        .min(MAX_TRACKING_DELAY_TICKS)
}

impl<T: Transport> Drop for Dls<T> {
    fn drop(&mut self) {
        if let Err(e) = self.force_tracking_off() {
            warn!("could not stop tracking on close: {}", e);
        }
    }
}
