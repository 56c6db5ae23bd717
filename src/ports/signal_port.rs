//! Signal file access port trait.

use crate::domain::error::RankfolioError;
use crate::domain::signal::SignalRow;
use std::path::Path;

pub trait SignalPort {
    /// Read every row of a signal file. An empty file is an error.
    fn read_signals(&self, path: &Path) -> Result<Vec<SignalRow>, RankfolioError>;

    /// Write rows to a signal file, creating parent directories.
    fn write_signals(&self, path: &Path, rows: &[SignalRow]) -> Result<(), RankfolioError>;
}
