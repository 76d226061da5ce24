use jep106::JEP106Code;
use log::{debug, info, warn};
use rust_fsm::*;

use crate::error::JtagError;
use crate::interface::{BitBang, JtagInterface, ResetLine};
use crate::jtag::jtag_state_machine::{tms_path, JtagState as JS, JtagStateMachine};

const TAP_DEVICE_MAX: usize = 8;
// what comes back once the ones shifted in have passed every TAP
const END_OF_CHAIN: u32 = 0xffff_ffff;

/// Drives a scan chain through a bit-bang adapter, tracking the TAP state as it goes.
pub struct Jtag<T> {
    pub interface: T,
    state_machine: StateMachine<JtagStateMachine>,
}

impl<T: BitBang> Jtag<T> {
    /// Wraps `interface` without touching the lines. The TAP is assumed to be in Reset.
    pub fn new(interface: T) -> Self {
        Jtag {
            interface,
            state_machine: StateMachine::new(),
        }
    }

    pub fn state(&self) -> JS {
        *self.state_machine.state()
    }

    pub fn write_tms(&mut self, tms: &[bool]) -> Result<(), JtagError> {
        self.interface.write_tms(tms)?;
        for t in tms {
            self.consume(*t)?;
        }
        Ok(())
    }

    pub fn raw_write_data(&mut self, tdi: &[bool], exit: bool) -> Result<(), JtagError> {
        self.interface.write_data(tdi, exit)?;
        if exit && !tdi.is_empty() {
            self.consume(true)?;
        }
        Ok(())
    }

    pub fn raw_read_data(&mut self, tditdo: &mut [bool], exit: bool) -> Result<(), JtagError> {
        self.interface.read_data(tditdo, exit)?;
        if exit && !tditdo.is_empty() {
            self.consume(true)?;
        }
        Ok(())
    }

    /// Five TMS highs, which reach Test-Logic-Reset from any state.
    pub fn reset(&mut self) -> Result<(), JtagError> {
        debug!("tap reset via tms");
        self.write_tms(&[true; 5])
    }

    /// Pulses TRST. The TAP is back in Reset afterwards.
    pub fn trst_pulse(&mut self) -> Result<(), JtagError> {
        debug!("tap reset via trst");
        self.interface.reset_line(ResetLine::Assert)?;
        self.interface.reset_line(ResetLine::Deassert)?;
        self.forget_state();
        Ok(())
    }

    /// Goes back to assuming Reset without touching the lines, e.g. after the adapter
    /// was pointed at another chain.
    pub fn forget_state(&mut self) {
        self.state_machine = StateMachine::new();
    }

    pub fn change_state(&mut self, to: JS) -> Result<(), JtagError> {
        let from = self.state();
        if to == JS::Reset {
            return self.reset();
        }
        let path = tms_path(from, to).ok_or(JtagError::Unreachable { from, to })?;
        self.write_tms(&path)
    }

    pub fn write_ir(&mut self, ir: &[bool]) -> Result<(), JtagError> {
        self.change_state(JS::ShiftIR)?;
        self.raw_write_data(ir, true)?;
        self.change_state(JS::RunIdle)
    }

    /// Shifts `data` through the data register, replacing it with what came out.
    pub fn read_write_dr(&mut self, data: &mut [bool]) -> Result<(), JtagError> {
        self.change_state(JS::ShiftDR)?;
        self.raw_read_data(data, true)?;
        self.change_state(JS::RunIdle)
    }

    /// Resets the chain and reads back the IDCODE of every TAP, nearest to TDO first.
    /// TAPs without an IDCODE register report 0.
    pub fn scan(&mut self) -> Result<Vec<u32>, JtagError> {
        self.reset()?;

        let mut data = vec![true; (TAP_DEVICE_MAX + 1) * 32];
        self.read_write_dr(&mut data)?;

        let mut idcodes = Vec::new();
        let mut i = 0;
        while i < data.len() && idcodes.len() < TAP_DEVICE_MAX {
            if !data[i..].contains(&true) {
                warn!("tdo stuck low after {} bits", i);
                break;
            }
            if data[i] {
                if i + 32 > data.len() {
                    break;
                }
                let idcode = data[i..i + 32]
                    .iter()
                    .rev()
                    .fold(0, |x, y| (x << 1) | *y as u32);
                if idcode == END_OF_CHAIN {
                    break;
                }
                i += 32;
                // Continuation code
                let cc = (idcode >> 8) & 0b1111;
                // Identity code
                let id = (idcode >> 1) & 0b0111_1111;
                info!(
                    "{} device (IDCODE:{:#010x}) found",
                    JEP106Code::new(cc as u8, id as u8)
                        .get()
                        .unwrap_or("Unknown"),
                    idcode
                );
                idcodes.push(idcode);
            } else {
                info!("bypass device found");
                idcodes.push(0);
                i += 1;
            }
        }
        Ok(idcodes)
    }

    fn consume(&mut self, tms: bool) -> Result<(), JtagError> {
        let from = self.state();
        self.state_machine
            .consume(&tms)
            .map(|_| ())
            .map_err(|_| JtagError::Transition { from, tms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::interface::mmap_gpio::MmapGpio;
    use crate::interface::BitValue;

    const ARM_IDCODE: u32 = 0x4ba0_0477;

    /// One TAP whose DR is a 32-bit IDCODE register, clocked on rising TCK edges.
    struct SimTap {
        tap: StateMachine<JtagStateMachine>,
        tck: bool,
        dr: u32,
        idcode: u32,
        trst_asserted: bool,
    }

    impl SimTap {
        fn new(idcode: u32) -> Self {
            SimTap {
                tap: StateMachine::new(),
                tck: false,
                dr: 0,
                idcode,
                trst_asserted: false,
            }
        }
    }

    impl BitBang for SimTap {
        fn sample(&self) -> Result<BitValue, BackendError> {
            Ok(BitValue::from(self.dr & 1 != 0))
        }

        fn drive(&mut self, tck: bool, tms: bool, tdi: bool) -> Result<(), BackendError> {
            if tck && !self.tck && !self.trst_asserted {
                match self.tap.state() {
                    JS::CaptureDR => self.dr = self.idcode,
                    JS::ShiftDR => self.dr = (self.dr >> 1) | ((tdi as u32) << 31),
                    _ => (),
                }
                self.tap.consume(&tms).unwrap();
            }
            self.tck = tck;
            Ok(())
        }

        fn reset_line(&mut self, trst: ResetLine) -> Result<(), BackendError> {
            match trst {
                ResetLine::Assert => {
                    self.trst_asserted = true;
                    self.tap = StateMachine::new();
                }
                ResetLine::Deassert => self.trst_asserted = false,
                ResetLine::NoChange => (),
            }
            Ok(())
        }
    }

    #[test]
    fn scan_finds_the_idcode() {
        let mut jtag = Jtag::new(SimTap::new(ARM_IDCODE));
        assert_eq!(jtag.scan().unwrap(), vec![ARM_IDCODE]);
        assert_eq!(jtag.state(), JS::RunIdle);
        assert_eq!(jtag.interface.tap.state(), &JS::RunIdle);
    }

    #[test]
    fn tracked_state_follows_the_tap() {
        let mut jtag = Jtag::new(SimTap::new(ARM_IDCODE));
        jtag.reset().unwrap();
        for &to in &[JS::ShiftIR, JS::PauseDR, JS::UpdateIR, JS::RunIdle, JS::Exit2DR] {
            jtag.change_state(to).unwrap();
            assert_eq!(jtag.state(), to);
            assert_eq!(jtag.interface.tap.state(), &to);
        }
    }

    #[test]
    fn write_ir_ends_in_idle() {
        let mut jtag = Jtag::new(SimTap::new(ARM_IDCODE));
        jtag.write_ir(&[false, true, true, true]).unwrap();
        assert_eq!(jtag.state(), JS::RunIdle);
        assert_eq!(jtag.interface.tap.state(), &JS::RunIdle);
    }

    #[test]
    fn trst_pulse_returns_to_reset() {
        let mut jtag = Jtag::new(SimTap::new(ARM_IDCODE));
        jtag.change_state(JS::ShiftDR).unwrap();
        jtag.trst_pulse().unwrap();
        assert_eq!(jtag.state(), JS::Reset);
        assert_eq!(jtag.interface.tap.state(), &JS::Reset);
        assert!(!jtag.interface.trst_asserted);
    }

    #[test]
    fn unconfigured_backend_is_reported() {
        let mut jtag = Jtag::new(MmapGpio::new());
        assert_eq!(
            jtag.scan(),
            Err(JtagError::Backend(BackendError::NotConfigured))
        );
        assert_eq!(
            jtag.trst_pulse(),
            Err(JtagError::Backend(BackendError::NotConfigured))
        );
    }
}
