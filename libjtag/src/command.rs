//! Text commands accepted by the `mmap-gpio-jtag` tool.
//!
//! ```text
//! mmap_gpio_config <file> <size> <tdo byte> <tdo bit> <tdi byte> <tdi bit> <trst byte> <trst bit> <tms byte> <tms bit> <tck byte> <tck bit>
//! mmap_gpio_set_pin <byte> <bit> <value>
//! mmap_gpio_get_pin <byte> <bit>
//! init | jtag_reset | trst_pulse | scan | shutdown
//! ```
//!
//! Numbers are base 10. Blank lines and `#` comments are skipped.

use std::path::PathBuf;
use std::str::FromStr;

use log::info;

use crate::error::CommandError;
use crate::interface::mmap_gpio::{MmapGpio, PinConfig, PinSpec};
use crate::interface::BitBang;
use crate::jtag::jtag::Jtag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Config {
        path: PathBuf,
        size: i64,
        pins: PinConfig,
    },
    SetPin {
        byte: i64,
        bit: i64,
        value: i64,
    },
    GetPin {
        byte: i64,
        bit: i64,
    },
    Init,
    JtagReset,
    TrstPulse,
    Scan,
    Shutdown,
}

impl Command {
    /// Parses one script line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = match line.find('#') {
            Some(comment) => &line[..comment],
            None => line,
        };
        let mut words = line.split_whitespace();
        let name = match words.next() {
            Some(name) => name,
            None => return Ok(None),
        };
        let args: Vec<&str> = words.collect();

        let command = match name {
            "mmap_gpio_config" => {
                arity(name, &args, 12)?;
                let n = |i: usize| number(name, args[i]);
                let pin = |i: usize| -> Result<PinSpec, CommandError> {
                    Ok(PinSpec::new(n(i)?, n(i + 1)?))
                };
                Command::Config {
                    path: PathBuf::from(args[0]),
                    size: n(1)?,
                    pins: PinConfig {
                        tdo: pin(2)?,
                        tdi: pin(4)?,
                        trst: pin(6)?,
                        tms: pin(8)?,
                        tck: pin(10)?,
                    },
                }
            }
            "mmap_gpio_set_pin" => {
                arity(name, &args, 3)?;
                Command::SetPin {
                    byte: number(name, args[0])?,
                    bit: number(name, args[1])?,
                    value: number(name, args[2])?,
                }
            }
            "mmap_gpio_get_pin" => {
                arity(name, &args, 2)?;
                Command::GetPin {
                    byte: number(name, args[0])?,
                    bit: number(name, args[1])?,
                }
            }
            "init" | "jtag_reset" | "trst_pulse" | "scan" | "shutdown" => {
                arity(name, &args, 0)?;
                match name {
                    "init" => Command::Init,
                    "jtag_reset" => Command::JtagReset,
                    "trst_pulse" => Command::TrstPulse,
                    "scan" => Command::Scan,
                    _ => Command::Shutdown,
                }
            }
            _ => return Err(CommandError::UnknownCommand(name.to_string())),
        };
        Ok(Some(command))
    }

    pub fn execute(&self, jtag: &mut Jtag<MmapGpio>) -> Result<(), CommandError> {
        match self {
            Command::Config { path, size, pins } => {
                // whatever was tracked belonged to the previous chain
                jtag.forget_state();
                jtag.interface.configure(path, *size, pins)?;
            }
            Command::SetPin { byte, bit, value } => {
                jtag.interface.set_raw_bit(*byte, *bit, *value)?;
            }
            Command::GetPin { byte, bit } => {
                let value = jtag.interface.get_raw_bit(*byte, *bit)?;
                info!("mmap_gpio: byte {}, bit {} is {:?}", byte, bit, value);
            }
            Command::Init => jtag.interface.init()?,
            Command::JtagReset => jtag.reset()?,
            Command::TrstPulse => jtag.trst_pulse()?,
            Command::Scan => {
                let idcodes = jtag.scan()?;
                info!("{} tap(s) on the chain", idcodes.len());
            }
            Command::Shutdown => jtag.interface.shutdown(),
        }
        Ok(())
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)?.ok_or_else(|| CommandError::Syntax {
            command: s.to_string(),
            reason: "empty command".to_string(),
        })
    }
}

fn arity(command: &str, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandError::Syntax {
            command: command.to_string(),
            reason: format!(
                "invalid number of arguments: expected {}, got {}",
                expected,
                args.len()
            ),
        })
    }
}

fn number(command: &str, word: &str) -> Result<i64, CommandError> {
    word.parse().map_err(|_| CommandError::Syntax {
        command: command.to_string(),
        reason: format!("{:?} is not a base 10 integer", word),
    })
}
