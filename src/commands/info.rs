//! Info command implementation

use xo2prog_core::programmer::SpiMaster;
use xo2prog_core::{Result, Session};

/// Identify the device, enter configuration mode and dump its registers
pub fn run_info<M: SpiMaster + ?Sized>(
    master: &mut M,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(master);
    let id = session.identify()?;

    let result = session.enable().and_then(|()| print_info(&mut session, id));
    // ISC_ENABLE_X may have been accepted even when enable failed
    if let Err(e) = session.disable() {
        log::warn!("Failed to leave configuration mode: {}", e);
    }
    Ok(result?)
}

fn print_info<M: SpiMaster + ?Sized>(session: &mut Session<'_, M>, id: u32) -> Result<()> {
    let status = session.read_status()?;
    let features = session.read_features()?;
    let usercode = session.read_usercode()?;

    println!("MachXO2-256 Information");
    println!("=======================");
    println!();
    println!("Device ID:       0x{:08X}", id);
    println!("Status:          {}", status);
    println!(
        "Feature row:     0x{:08X} 0x{:08X}",
        features.feature_row0, features.feature_row1
    );
    println!("FEABITS:         0x{:04X}", features.feabits);
    println!("USERCODE:        0x{:08X}", usercode);
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use xo2prog_dummy::{DummyConfig, DummyMachXo2};

    #[test]
    fn test_info_leaves_config_mode() {
        let mut dev = DummyMachXo2::new_default();
        run_info(&mut dev).unwrap();
        assert_eq!(dev.refreshes(), 1);
        assert!(!dev.enabled());
    }

    #[test]
    fn test_failed_enable_still_disables() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            fail_enable: true,
            ..Default::default()
        });
        assert!(run_info(&mut dev).is_err());
        assert_eq!(dev.refreshes(), 1);
        assert!(dev.frames().iter().all(|f| f[0] != 0xE7));
    }
}
