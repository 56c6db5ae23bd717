//! Price data access port trait.

use crate::domain::error::RankfolioError;
use crate::domain::price::PriceTable;
use std::path::Path;

pub trait PricePort {
    fn read_prices(&self, path: &Path) -> Result<PriceTable, RankfolioError>;
}
