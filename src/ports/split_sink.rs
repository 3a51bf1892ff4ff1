//! Split persistence port trait.

use std::path::PathBuf;

use crate::domain::error::PrepError;
use crate::domain::split::SplitSet;

/// Persists the three splits, all or nothing. Returns the artifact paths in
/// train, validation, test order.
pub trait SplitSink {
    fn persist(&self, splits: &SplitSet) -> Result<Vec<PathBuf>, PrepError>;
}
