//! Check command implementation

use std::path::Path;

use super::load_jedec;

/// Parse a JEDEC file and print what it contains
pub fn run_check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (fuses, summary) = load_jedec(path)?;

    println!("JEDEC file:      {}", path.display());
    match summary.fuse_count {
        Some(n) => println!("Fuse count:      {} (QF)", n),
        None => println!("Fuse count:      {} (no QF field)", fuses.size()),
    }
    println!("Fuses set:       {}", fuses.count_ones());
    println!("Checksum:        0x{:04X}", summary.computed_checksum);
    println!("Checksum OK");
    Ok(())
}
