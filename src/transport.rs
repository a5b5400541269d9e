//! Line-oriented byte transport.
//!
//! The rangefinder talks over a plain serial link. [`Transport`] is the seam
//! between the protocol session and the link so sessions can be driven by
//! anything that moves terminated lines, and [`SerialTransport`] is the
//! implementation over a real port.

use crate::constants::*;
use crate::error::{DlsError, Result};
use crate::types::{ReadMode, SessionConfig};
use log::{trace, warn};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Byte channel carrying one request line and one response line per exchange.
///
/// Implementations need not be thread safe: a session owns its transport
/// exclusively and never pipelines requests.
pub trait Transport {
    /// Write a complete request line. Short writes are reported, not retried.
    fn write_line(&mut self, line: &[u8]) -> Result<()>;

    /// Read one response line, terminator included when it arrived.
    fn read_line(&mut self) -> Result<Vec<u8>>;
}

/// Serial port transport (8N1, no flow control)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    config: SessionConfig,
}

impl SerialTransport {
    /// Open the port named in `config` and apply its settings
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let port = Self::open_port(config)?;
        Ok(SerialTransport {
            port,
            config: config.clone(),
        })
    }

    fn open_port(config: &SessionConfig) -> Result<Box<dyn SerialPort>> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()?;
        port.clear(ClearBuffer::Input)?;
        Ok(port)
    }

    /// Re-apply `config`, reopening the device when the port path changed
    pub fn reconfigure(&mut self, config: &SessionConfig) -> Result<()> {
        if config.port != self.config.port {
            self.port = Self::open_port(config)?;
        } else {
            self.port.set_baud_rate(config.baud_rate)?;
            self.port.set_timeout(config.read_timeout())?;
            self.port.clear(ClearBuffer::Input)?;
        }
        self.config = config.clone();
        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Name of the underlying device, if known
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    fn deadline(&self) -> Option<Duration> {
        match self.config.read_mode {
            ReadMode::NonBlocking => Some(self.config.response_deadline),
            ReadMode::Blocking => None,
        }
    }
}

impl Transport for SerialTransport {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        // Drop stale bytes so the next line read answers this request
        self.port.clear(ClearBuffer::Input)?;
        trace!("TX {}", String::from_utf8_lossy(line).escape_default());

        let written = self.port.write(line)?;
        if written < line.len() {
            warn!("short write: {} of {} bytes sent", written, line.len());
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let deadline = self.deadline();
        let line = read_line_from(&mut self.port, MAX_READ_SIZE, deadline)?;
        trace!("RX {}", String::from_utf8_lossy(&line).escape_default());
        Ok(line)
    }
}

/// Read one `\r\n` terminated line in single-byte reads.
///
/// At most `max_bytes - 1` bytes are collected. Empty reads and read
/// timeouts do not end the line: the reader keeps polling until the
/// terminator arrives or `deadline` (if any) elapses. A deadline reached
/// with partial data returns that data; with no data it fails with
/// [`DlsError::Timeout`].
pub fn read_line_from<R: Read + ?Sized>(
    reader: &mut R,
    max_bytes: usize,
    deadline: Option<Duration>,
) -> Result<Vec<u8>> {
    let limit = max_bytes.saturating_sub(1);
    let started = Instant::now();
    let mut line = Vec::with_capacity(limit);
    let mut byte = [0u8; 1];

    while line.len() < limit {
        match reader.read(&mut byte) {
            Ok(1) => {
                line.push(byte[0]);
                if line.ends_with(TERMINATOR) {
                    return Ok(line);
                }
                continue;
            }
            Ok(_) => {}
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(DlsError::Io(e)),
        }

        if deadline.is_some_and(|deadline| started.elapsed() >= deadline) {
            if line.is_empty() {
                return Err(DlsError::Timeout);
            }
            warn!(
                "response incomplete after {:?}: {}",
                started.elapsed(),
                String::from_utf8_lossy(&line).escape_default()
            );
            return Ok(line);
        }
        thread::sleep(POLL_INTERVAL);
    }

    warn!(
        "response exceeded {} bytes without terminator: {}",
        limit,
        String::from_utf8_lossy(&line).escape_default()
    );
    Ok(line)
}
