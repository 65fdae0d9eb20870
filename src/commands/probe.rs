//! Probe command implementation

use xo2prog_core::programmer::SpiMaster;
use xo2prog_core::Session;

/// Identify the device and print its ID
pub fn run_probe<M: SpiMaster + ?Sized>(
    master: &mut M,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(master);
    match session.identify() {
        Ok(id) => {
            println!("Found MachXO2-256");
            println!("  Device ID: 0x{:08X}", id);
            Ok(())
        }
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            Err(Box::new(e))
        }
    }
}
