//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "xo2prog")]
#[command(author, version, about = "MachXO2-256 configuration flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and check the device ID
    Probe {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Show status, feature row, FEABITS and USERCODE
    Info {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Parse a JEDEC file and check its fuse checksum
    Check {
        /// JEDEC file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Program a JEDEC file into the configuration flash
    Program {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// JEDEC file
        #[arg(short, long)]
        input: PathBuf,

        /// Read back and compare after programming
        #[arg(long)]
        verify: bool,

        /// Give up when the device stays busy for this many status reads
        #[arg(long)]
        max_polls: Option<u32>,
    },

    /// List supported programmers
    ListProgrammers,
}
