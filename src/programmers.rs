//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use xo2prog_core::programmer::{ProgrammerInfo, SpiMaster};

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory MachXO2-256 emulator for testing",
        requires_root: false,
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
        requires_root: false,
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its canonical name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.iter().any(|a| *a == name))
        .map(|p| p.name)
}

/// Open the programmer described by a programmer string
///
/// The string can be just the name (e.g., "dummy") or include parameters
/// (e.g., "linux_spi:dev=/dev/spidev0.0,spispeed=1000").
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
) -> Result<Box<dyn SpiMaster + Send>, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            if !options.is_empty() {
                log::warn!("dummy: ignoring {} option(s)", options.len());
            }
            Ok(Box::new(xo2prog_dummy::DummyMachXo2::new_default()))
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            log::info!("Opening Linux SPI programmer...");
            xo2prog_linux_spi::open_linux_spi(&options).map_err(|e| {
                format!(
                    "Failed to open Linux SPI device: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG spi $USER",
                    e
                )
                .into()
            })
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'xo2prog list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_programmer_string("linux_spi:dev=/dev/spidev0.0,spispeed=1000"),
            (
                "linux_spi",
                vec![("dev", "/dev/spidev0.0"), ("spispeed", "1000")]
            )
        );
        // options without '=' are dropped
        assert_eq!(
            parse_programmer_string("linux_spi:bogus,mode=3"),
            ("linux_spi", vec![("mode", "3")])
        );
    }

    #[cfg(feature = "linux-spi")]
    #[test]
    fn test_find_programmer_alias() {
        assert_eq!(find_programmer("spidev"), Some("linux_spi"));
        assert_eq!(find_programmer("linux_spi"), Some("linux_spi"));
    }

    #[test]
    fn test_unknown_programmer() {
        assert_eq!(find_programmer("ch341a"), None);
        assert!(open_programmer("ch341a").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        let mut master = open_programmer("dummy").unwrap();
        let id = xo2prog_core::protocol::read_device_id(&mut master).unwrap();
        assert_eq!(id, xo2prog_core::frame::MACHXO2_256_ID);
    }
}
