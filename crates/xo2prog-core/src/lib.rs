//! xo2prog-core - Core library for MachXO2 configuration programming
//!
//! This crate provides the device protocol and the JEDEC fuse-map parser
//! needed to program the configuration flash of a Lattice MachXO2-256
//! over SPI. It is designed to be `no_std` compatible for use in embedded
//! environments; the SPI bus and the delay primitive are supplied by the
//! caller through the [`programmer::SpiMaster`] trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (boxed programmers)
//! - `is_sync` - Compile the protocol as blocking code
//!
//! # Example
//!
//! ```ignore
//! use xo2prog_core::{jedec, FuseTable, Session};
//!
//! fn flash<M: SpiMaster>(master: &mut M, jed: &[u8]) -> xo2prog_core::Result<()> {
//!     let mut fuses = FuseTable::new();
//!     jedec::parse_jedec(jed, &mut fuses).expect("bad JEDEC file");
//!
//!     let mut session = Session::new(master);
//!     session.identify()?;
//!     session.enable()?;
//!     session.program(&fuses, &mut NoProgress)?;
//!     session.disable()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
pub mod frame;
pub mod fuse;
pub mod jedec;
pub mod programmer;
pub mod protocol;
pub mod session;
pub mod status;

pub use error::{Error, Result};
pub use fuse::{FuseTable, FUSE_COUNT};
pub use session::{NoProgress, Phase, ProgramProgress, Session};
pub use status::StatusRegister;
