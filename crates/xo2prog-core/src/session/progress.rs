//! Progress reporting for long-running session operations

/// Progress callback for program and verify
///
/// Implement this trait to receive updates while the configuration flash
/// is erased, programmed and read back.
pub trait ProgramProgress {
    /// Called before the configuration flash erase is issued
    fn erasing(&mut self);

    /// Called when starting to program `total_pages` pages
    fn programming(&mut self, total_pages: usize);

    /// Called after each page is programmed
    fn page_programmed(&mut self, pages_done: usize);

    /// Called when starting to read back `total_pages` pages
    fn verifying(&mut self, total_pages: usize);

    /// Called after each page is read back and matched
    fn page_verified(&mut self, pages_done: usize);

    /// Called after the DONE bit has been programmed
    fn done(&mut self);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ProgramProgress for NoProgress {
    fn erasing(&mut self) {}
    fn programming(&mut self, _total_pages: usize) {}
    fn page_programmed(&mut self, _pages_done: usize) {}
    fn verifying(&mut self, _total_pages: usize) {}
    fn page_verified(&mut self, _pages_done: usize) {}
    fn done(&mut self) {}
}
