use std::convert::TryFrom;
use std::fmt;

use crate::error::ConfigError;

/// The five JTAG lines, in the order they are given to `mmap_gpio_config`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Tdo,
    Tdi,
    Trst,
    Tms,
    Tck,
}

impl Signal {
    pub const ALL: [Signal; 5] = [Signal::Tdo, Signal::Tdi, Signal::Trst, Signal::Tms, Signal::Tck];
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Tdo => "TDO",
            Signal::Tdi => "TDI",
            Signal::Trst => "TRST",
            Signal::Tms => "TMS",
            Signal::Tck => "TCK",
        };
        f.pad(name)
    }
}

/// An unvalidated (byte, bit) coordinate as supplied by the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinSpec {
    pub byte: i64,
    pub bit: i64,
}

impl PinSpec {
    pub fn new(byte: i64, bit: i64) -> Self {
        PinSpec { byte, bit }
    }
}

/// Requested placement of every signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub tdo: PinSpec,
    pub tdi: PinSpec,
    pub trst: PinSpec,
    pub tms: PinSpec,
    pub tck: PinSpec,
}

impl PinConfig {
    pub fn get(&self, signal: Signal) -> PinSpec {
        match signal {
            Signal::Tdo => self.tdo,
            Signal::Tdi => self.tdi,
            Signal::Trst => self.trst,
            Signal::Tms => self.tms,
            Signal::Tck => self.tck,
        }
    }
}

/// A coordinate known to lie inside the register window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    byte: usize,
    bit: u8,
}

impl Pin {
    /// Checks `0 <= byte < size` and `0 <= bit <= 7`.
    pub fn validate(spec: PinSpec, size: usize) -> Option<Pin> {
        let byte = usize::try_from(spec.byte).ok().filter(|b| *b < size)?;
        let bit = u8::try_from(spec.bit).ok().filter(|b| *b < 8)?;
        Some(Pin { byte, bit })
    }

    pub fn byte(&self) -> usize {
        self.byte
    }

    pub fn bit(&self) -> u8 {
        self.bit
    }
}

/// Validated placement of every signal. Built once per configuration and never re-checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinMap {
    pub tdo: Pin,
    pub tdi: Pin,
    pub trst: Pin,
    pub tms: Pin,
    pub tck: Pin,
}

impl PinMap {
    /// Validates the signals in `Signal::ALL` order and reports the first one out of range.
    pub fn validate(config: &PinConfig, size: usize) -> Result<PinMap, ConfigError> {
        let check = |signal: Signal| {
            let spec = config.get(signal);
            Pin::validate(spec, size).ok_or(ConfigError::PinOutOfRange {
                signal,
                byte: spec.byte,
                bit: spec.bit,
                size,
            })
        };

        Ok(PinMap {
            tdo: check(Signal::Tdo)?,
            tdi: check(Signal::Tdi)?,
            trst: check(Signal::Trst)?,
            tms: check(Signal::Tms)?,
            tck: check(Signal::Tck)?,
        })
    }

    pub fn get(&self, signal: Signal) -> Pin {
        match signal {
            Signal::Tdo => self.tdo,
            Signal::Tdi => self.tdi,
            Signal::Trst => self.trst,
            Signal::Tms => self.tms,
            Signal::Tck => self.tck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(coords: [(i64, i64); 5]) -> PinConfig {
        let p = |i: usize| PinSpec::new(coords[i].0, coords[i].1);
        PinConfig {
            tdo: p(0),
            tdi: p(1),
            trst: p(2),
            tms: p(3),
            tck: p(4),
        }
    }

    #[test]
    fn pin_bounds() {
        assert!(Pin::validate(PinSpec::new(0, 0), 1).is_some());
        assert!(Pin::validate(PinSpec::new(31, 7), 32).is_some());
        assert!(Pin::validate(PinSpec::new(32, 0), 32).is_none());
        assert!(Pin::validate(PinSpec::new(-1, 0), 32).is_none());
        assert!(Pin::validate(PinSpec::new(0, 8), 32).is_none());
        assert!(Pin::validate(PinSpec::new(0, -1), 32).is_none());
        assert!(Pin::validate(PinSpec::new(0, 0), 0).is_none());
    }

    #[test]
    fn valid_map_keeps_coordinates() {
        let pins = PinMap::validate(&config([(3, 7), (1, 0), (5, 2), (5, 3), (5, 4)]), 32).unwrap();
        assert_eq!((pins.tdo.byte(), pins.tdo.bit()), (3, 7));
        assert_eq!((pins.tdi.byte(), pins.tdi.bit()), (1, 0));
        assert_eq!(pins.get(Signal::Tck).bit(), 4);
    }

    #[test]
    fn first_offending_signal_is_reported() {
        let err = PinMap::validate(&config([(0, 0), (0, 0), (9, 0), (0, 9), (0, 0)]), 8).unwrap_err();
        match err {
            ConfigError::PinOutOfRange {
                signal, byte, bit, size,
            } => {
                assert_eq!(signal, Signal::Trst);
                assert_eq!((byte, bit, size), (9, 0, 8));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn signal_names() {
        let names: Vec<_> = Signal::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["TDO", "TDI", "TRST", "TMS", "TCK"]);
    }
}
