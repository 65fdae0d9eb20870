//! CLI command implementations
//!
//! Device commands take the opened programmer as `&mut dyn SpiMaster` and
//! run a [`Session`](xo2prog_core::Session) on it; `check` only touches the
//! JEDEC file.

mod check;
mod info;
mod list;
mod probe;
mod program;

pub use check::run_check;
pub use info::run_info;
pub use list::list_programmers;
pub use probe::run_probe;
pub use program::{load_jedec, run_program};
