use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::interface::mmap_gpio::Signal;
use crate::jtag::jtag_state_machine::JtagState;

/// Failures of `MmapGpio::configure`. The backend is left unconfigured after any of them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid mapping size {size}")]
    InvalidSize { size: i64 },

    #[error("cannot open memory mapped file {}", .path.display())]
    DeviceOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot map {size} bytes of {}", .path.display())]
    MappingFailed {
        path: PathBuf,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("{signal} pin (byte {byte}, bit {bit}) is outside the {size} byte window")]
    PinOutOfRange {
        signal: Signal,
        byte: i64,
        bit: i64,
        size: usize,
    },
}

/// Failures of the bit-bang primitives.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    #[error("mmap_gpio is not configured")]
    NotConfigured,
}

/// Failures of raw register access.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticError {
    #[error("must call mmap_gpio_config before accessing any pins")]
    NotConfigured,

    #[error("byte {byte}, bit {bit}{} out of range for a {size} byte window", value_suffix(.value))]
    RangeError {
        byte: i64,
        bit: i64,
        value: Option<i64>,
        size: usize,
    },
}

fn value_suffix(value: &Option<i64>) -> String {
    match value {
        Some(v) => format!(", value {}", v),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JtagError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("tap state machine rejected tms={tms} in {from:?}")]
    Transition { from: JtagState, tms: bool },

    #[error("no tms path from {from:?} to {to:?}")]
    Unreachable { from: JtagState, to: JtagState },
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{command}: {reason}")]
    Syntax {
        command: String,
        reason: String,
    },

    #[error("unknown command {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Diagnostic(#[from] DiagnosticError),

    #[error(transparent)]
    Jtag(#[from] JtagError),
}

impl From<BackendError> for CommandError {
    fn from(e: BackendError) -> Self {
        CommandError::Jtag(JtagError::Backend(e))
    }
}
