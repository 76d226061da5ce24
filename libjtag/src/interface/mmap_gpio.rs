//! Bit-banged JTAG over a memory mapped register block.
//!
//! Each of the five JTAG lines lives at an operator chosen bit inside a shared mapping of a
//! device file such as `/dev/mem` or a UIO node. Byte 1, bit 7 is the most significant bit of
//! the second byte of the mapping.
//!
//! Polarity: TDO reads `High` when its bit is 1. TRST is active-low, so asserting it clears
//! its bit and deasserting it sets the bit.

use std::convert::TryFrom;
use std::path::Path;

use log::{debug, info};

use crate::error::{BackendError, ConfigError, DiagnosticError};
use crate::interface::{BitBang, BitValue, ResetLine};

mod pins;
mod window;

pub use pins::{Pin, PinConfig, PinMap, PinSpec, Signal};
pub use window::RegisterWindow;

struct Session {
    window: RegisterWindow,
    pins: PinMap,
}

/// A mmap_gpio adapter. Starts unconfigured; `configure` maps the registers.
#[derive(Default)]
pub struct MmapGpio {
    session: Option<Session>,
}

impl MmapGpio {
    pub fn new() -> Self {
        MmapGpio { session: None }
    }

    /// Opens and maps `size` bytes of `path`, then places the signals.
    ///
    /// Any previous session is released first. On error the adapter is left unconfigured and
    /// the device is closed again.
    pub fn configure<P: AsRef<Path>>(
        &mut self,
        path: P,
        size: i64,
        pins: &PinConfig,
    ) -> Result<(), ConfigError> {
        self.shutdown();

        let len = usize::try_from(size).map_err(|_| ConfigError::InvalidSize { size })?;
        let window = RegisterWindow::open(path.as_ref(), len)?;
        let pins = PinMap::validate(pins, window.len())?;

        debug!("mmap_gpio config: {}, {} bytes", window.path().display(), len);
        for signal in Signal::ALL.iter() {
            let pin = pins.get(*signal);
            debug!("\t{:<4} byte {} bit {}", signal, pin.byte(), pin.bit());
        }

        self.session = Some(Session { window, pins });
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    pub fn pins(&self) -> Option<&PinMap> {
        self.session.as_ref().map(|s| &s.pins)
    }

    /// Size of the mapped window in bytes.
    pub fn window_size(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.window.len())
    }

    /// Sets a bit anywhere in the window, named signal or not. `value` must be 0 or 1.
    pub fn set_raw_bit(&mut self, byte: i64, bit: i64, value: i64) -> Result<(), DiagnosticError> {
        let session = self.session.as_mut().ok_or(DiagnosticError::NotConfigured)?;
        let size = session.window.len();
        let range_error = DiagnosticError::RangeError {
            byte,
            bit,
            value: Some(value),
            size,
        };

        let pin = Pin::validate(PinSpec::new(byte, bit), size).ok_or(range_error)?;
        let level = match value {
            0 => false,
            1 => true,
            _ => return Err(range_error),
        };
        session.window.write_bit(pin.byte(), pin.bit(), level);

        debug!("mmap_gpio: set byte {}, bit {} to {}", byte, bit, value);
        Ok(())
    }

    /// Reads a bit anywhere in the window.
    pub fn get_raw_bit(&self, byte: i64, bit: i64) -> Result<BitValue, DiagnosticError> {
        let session = self.session.as_ref().ok_or(DiagnosticError::NotConfigured)?;
        let size = session.window.len();
        let pin = Pin::validate(PinSpec::new(byte, bit), size).ok_or(
            DiagnosticError::RangeError {
                byte,
                bit,
                value: None,
                size,
            },
        )?;
        Ok(BitValue::from(session.window.read_bit(pin.byte(), pin.bit())))
    }

    /// Unmaps the registers and closes the device. Does nothing when unconfigured.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            info!("mmap_gpio: releasing {}", session.window.path().display());
        }
    }

    fn session(&self) -> Result<&Session, BackendError> {
        self.session.as_ref().ok_or(BackendError::NotConfigured)
    }

    fn session_mut(&mut self) -> Result<&mut Session, BackendError> {
        self.session.as_mut().ok_or(BackendError::NotConfigured)
    }
}

impl BitBang for MmapGpio {
    fn sample(&self) -> Result<BitValue, BackendError> {
        let session = self.session()?;
        let tdo = session.pins.tdo;
        Ok(BitValue::from(session.window.read_bit(tdo.byte(), tdo.bit())))
    }

    fn drive(&mut self, tck: bool, tms: bool, tdi: bool) -> Result<(), BackendError> {
        let session = self.session_mut()?;
        let pins = session.pins;
        session.window.write_bit(pins.tck.byte(), pins.tck.bit(), tck);
        session.window.write_bit(pins.tms.byte(), pins.tms.bit(), tms);
        session.window.write_bit(pins.tdi.byte(), pins.tdi.bit(), tdi);
        Ok(())
    }

    fn reset_line(&mut self, trst: ResetLine) -> Result<(), BackendError> {
        let session = self.session_mut()?;
        let pin = session.pins.trst;
        match trst {
            ResetLine::Assert => session.window.write_bit(pin.byte(), pin.bit(), false),
            ResetLine::Deassert => session.window.write_bit(pin.byte(), pin.bit(), true),
            ResetLine::NoChange => (),
        }
        Ok(())
    }
}
