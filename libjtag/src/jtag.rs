use bitflags::bitflags;

pub mod jtag;
pub mod jtag_state_machine;

bitflags! {
    /// Line levels for one TCK cycle.
    #[derive(Default)]
    pub struct JtagBit: u32 {
        const NONE = 0;
        const TMS = 1 << 1;
        const TDI = 1 << 3;
        const TDO = 1 << 4;
    }
}
