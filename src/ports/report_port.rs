//! Result reporting port trait.

use crate::domain::error::RankfolioError;
use crate::domain::paper::{DailyStep, PaperResult};
use std::path::Path;

/// Port for persisting simulation output.
pub trait ReportPort {
    fn save_result(&self, path: &Path, result: &PaperResult) -> Result<(), RankfolioError>;

    fn save_curve(&self, path: &Path, steps: &[DailyStep]) -> Result<(), RankfolioError>;
}
