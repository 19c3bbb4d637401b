//! Data access port trait.

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;
use std::path::Path;

pub trait DataPort {
    /// Load bars in ascending timestamp order, keeping those whose date lies
    /// in `[start_date, end_date]` (either bound optional).
    fn load_bars(
        &self,
        path: &Path,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, StratsimError>;
}
