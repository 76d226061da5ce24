use crate::error::BackendError;
use crate::jtag::JtagBit;

pub mod mmap_gpio;

/// Level of a sampled line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitValue {
    Low,
    High,
}

impl BitValue {
    pub fn is_high(self) -> bool {
        self == BitValue::High
    }
}

impl From<bool> for BitValue {
    fn from(high: bool) -> Self {
        if high {
            BitValue::High
        } else {
            BitValue::Low
        }
    }
}

/// What to do with the TRST line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetLine {
    Assert,
    Deassert,
    NoChange,
}

/// The three primitives a bit-banged adapter has to provide.
///
/// Calls are synchronous and serial; implementations do no locking of their own.
pub trait BitBang {
    /// Sample TDO.
    fn sample(&self) -> Result<BitValue, BackendError>;
    /// Drive TCK, TMS and TDI to the given levels.
    fn drive(&mut self, tck: bool, tms: bool, tdi: bool) -> Result<(), BackendError>;
    /// Assert, deassert or leave TRST alone.
    fn reset_line(&mut self, trst: ResetLine) -> Result<(), BackendError>;

    /// Idle levels once the transport comes up: TCK low, TMS high, TDI low, TRST asserted.
    /// The TAP stays held in reset until TRST is released, e.g. by `Jtag::trst_pulse`.
    fn init(&mut self) -> Result<(), BackendError> {
        self.drive(false, true, false)?;
        self.reset_line(ResetLine::Assert)
    }
}

pub trait JtagInterface {
    fn write_tms(&mut self, tms: &[bool]) -> Result<(), BackendError> {
        let data: Vec<_> = tms
            .iter()
            .map(|x| if *x { JtagBit::TMS } else { JtagBit::empty() })
            .collect();
        self.raw_write(data.as_slice())
    }
    fn write_data(&mut self, tdi: &[bool], exit: bool) -> Result<(), BackendError> {
        let mut data: Vec<_> = tdi
            .iter()
            .map(|x| if *x { JtagBit::TDI } else { JtagBit::empty() })
            .collect();
        if exit {
            if let Some(last) = data.last_mut() {
                *last |= JtagBit::TMS;
            }
        }
        self.raw_write(data.as_slice())
    }
    fn read_data(&mut self, tditdo: &mut [bool], exit: bool) -> Result<(), BackendError> {
        let mut data: Vec<_> = tditdo
            .iter()
            .map(|x| if *x { JtagBit::TDI } else { JtagBit::empty() })
            .collect();
        if exit {
            if let Some(last) = data.last_mut() {
                *last |= JtagBit::TMS;
            }
        }
        self.raw_read(data.as_mut_slice())?;
        for (bit, pins) in tditdo.iter_mut().zip(data.iter()) {
            *bit = pins.contains(JtagBit::TDO);
        }
        Ok(())
    }

    /// Clock out one TCK cycle per element.
    fn raw_write(&mut self, data: &[JtagBit]) -> Result<(), BackendError>;
    /// Clock out one TCK cycle per element, replacing its TDO flag with the level
    /// sampled before the rising edge.
    fn raw_read(&mut self, data: &mut [JtagBit]) -> Result<(), BackendError>;
}

impl<T: BitBang> JtagInterface for T {
    fn raw_write(&mut self, data: &[JtagBit]) -> Result<(), BackendError> {
        for d in data {
            let tms = d.contains(JtagBit::TMS);
            let tdi = d.contains(JtagBit::TDI);
            self.drive(false, tms, tdi)?;
            self.drive(true, tms, tdi)?;
        }
        park_clock(self, data.last())
    }

    fn raw_read(&mut self, data: &mut [JtagBit]) -> Result<(), BackendError> {
        for d in data.iter_mut() {
            let tms = d.contains(JtagBit::TMS);
            let tdi = d.contains(JtagBit::TDI);
            self.drive(false, tms, tdi)?;
            let tdo = self.sample()?;
            self.drive(true, tms, tdi)?;
            d.set(JtagBit::TDO, tdo.is_high());
        }
        park_clock(self, data.last())
    }
}

// TCK idles low between sequences.
fn park_clock<T: BitBang + ?Sized>(
    interface: &mut T,
    last: Option<&JtagBit>,
) -> Result<(), BackendError> {
    match last {
        Some(d) => interface.drive(false, d.contains(JtagBit::TMS), d.contains(JtagBit::TDI)),
        None => Ok(()),
    }
}
