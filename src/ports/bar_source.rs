//! Bar source port trait.

use crate::domain::bar::BarSeries;
use crate::domain::error::PrepError;

/// Supplies one symbol's regular-session minute bars, sorted and
/// deduplicated.
pub trait BarSource {
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, PrepError>;

    fn list_symbols(&self) -> Result<Vec<String>, PrepError>;
}
