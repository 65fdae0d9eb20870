//! xo2prog - Configuration flash programmer for the Lattice MachXO2-256
//!
//! Parses JEDEC fuse maps and programs them into the device's configuration
//! flash over SPI.
//!
//! # Architecture
//!
//! All device commands go through an `xo2prog_core::Session` running on a
//! boxed `SpiMaster`, so the same command implementations work with the
//! in-memory emulator and with real hardware (Linux spidev).

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { programmer } => {
            let mut master = programmers::open_programmer(&programmer)?;
            commands::run_probe(&mut *master)
        }
        Commands::Info { programmer } => {
            let mut master = programmers::open_programmer(&programmer)?;
            commands::run_info(&mut *master)
        }
        Commands::Check { input } => commands::run_check(&input),
        Commands::Program {
            programmer,
            input,
            verify,
            max_polls,
        } => {
            let mut master = programmers::open_programmer(&programmer)?;
            commands::run_program(&mut *master, &input, verify, max_polls)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}
