//! Program command implementation

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use xo2prog_core::jedec::{self, ParseSummary};
use xo2prog_core::programmer::SpiMaster;
use xo2prog_core::protocol::PollConfig;
use xo2prog_core::{FuseTable, ProgramProgress, Session};

/// Progress reporter using indicatif progress bars
struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn create_bar(&mut self, total: usize, phase: &'static str) {
        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} pages ({{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn set_position(&self, pos: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(pos as u64);
        }
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl ProgramProgress for IndicatifProgress {
    fn erasing(&mut self) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Erasing configuration flash...");
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn programming(&mut self, total_pages: usize) {
        self.finish("Erase complete");
        self.create_bar(total_pages, "Programming");
    }

    fn page_programmed(&mut self, pages_done: usize) {
        self.set_position(pages_done);
    }

    fn verifying(&mut self, total_pages: usize) {
        self.finish("Program complete");
        self.create_bar(total_pages, "Verifying");
    }

    fn page_verified(&mut self, pages_done: usize) {
        self.set_position(pages_done);
    }

    fn done(&mut self) {
        self.finish("Program complete");
    }
}

/// Read and parse a JEDEC file
pub fn load_jedec(path: &Path) -> Result<(FuseTable, ParseSummary), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    log::debug!("Read {} bytes from {}", data.len(), path.display());

    let mut fuses = FuseTable::new();
    let summary = jedec::parse_jedec(&data[..], &mut fuses)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    log::info!(
        "Loaded {} ({} fuses set, checksum 0x{:04X})",
        path.display(),
        fuses.count_ones(),
        summary.computed_checksum
    );
    Ok((fuses, summary))
}

/// Program a JEDEC file into the device
pub fn run_program<M: SpiMaster + ?Sized>(
    master: &mut M,
    path: &Path,
    verify: bool,
    max_polls: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (fuses, _) = load_jedec(path)?;

    let mut poll = PollConfig::default();
    if let Some(n) = max_polls {
        poll = poll.with_max_polls(n);
    }

    program_fuses(master, &fuses, verify, poll)?;

    if verify {
        println!("Programmed and verified {}", path.display());
    } else {
        println!("Programmed {}", path.display());
    }
    Ok(())
}

fn program_fuses<M: SpiMaster + ?Sized>(
    master: &mut M,
    fuses: &FuseTable,
    verify: bool,
    poll: PollConfig,
) -> xo2prog_core::Result<()> {
    let mut session = Session::new(master).with_poll_config(poll);
    session.identify()?;

    let mut progress = IndicatifProgress::new();
    let result = session
        .enable()
        .and_then(|()| session.program(fuses, &mut progress))
        .and_then(|()| {
            if verify {
                session.verify(fuses, &mut progress)
            } else {
                Ok(())
            }
        });
    progress.finish(if result.is_ok() { "Done" } else { "Aborted" });

    // ISC_ENABLE_X may have been accepted even when enable failed
    if let Err(e) = session.disable() {
        log::warn!("Failed to leave configuration mode: {}", e);
    }
    result
}
