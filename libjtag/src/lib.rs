//! JTAG over memory mapped GPIO.
//!
//! `interface::mmap_gpio::MmapGpio` bit-bangs TCK/TMS/TDI/TDO/TRST inside a shared mapping
//! of a device file and implements `interface::BitBang`; `jtag::jtag::Jtag` drives a scan
//! chain through any `BitBang`.

pub mod command;
pub mod error;
pub mod interface;
pub mod jtag;

pub use crate::interface::mmap_gpio::MmapGpio;
