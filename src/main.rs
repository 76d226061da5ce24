use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use libjtag::command::Command;
use libjtag::jtag::jtag::Jtag;
use libjtag::MmapGpio;

/// Bit-bang JTAG through a memory mapped register block.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Command script, one command per line. Scripts run before -c commands.
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Single command, e.g. -c "mmap_gpio_set_pin 5 4 1"
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .filter(move |meta| {
            level == LevelFilter::Trace || !meta.target().contains("jtag_state_machine")
        })
        .apply()?;
    Ok(())
}

fn execute(jtag: &mut Jtag<MmapGpio>, line: &str) -> Result<()> {
    if let Some(command) = Command::parse(line)? {
        command.execute(jtag)?;
    }
    Ok(())
}

fn run(jtag: &mut Jtag<MmapGpio>, args: &Args) -> Result<()> {
    for file in &args.files {
        let script = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        for (n, line) in script.lines().enumerate() {
            execute(jtag, line).with_context(|| format!("{}:{}", file.display(), n + 1))?;
        }
    }
    for command in &args.commands {
        execute(jtag, command).with_context(|| format!("-c {:?}", command))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.log_level)?;

    let mut jtag = Jtag::new(MmapGpio::new());
    let result = run(&mut jtag, &args);
    jtag.interface.shutdown();
    result
}
