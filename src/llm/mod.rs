pub mod openrouter;

use anyhow::Result;

use crate::domain::essay::Essay;

/// External text-to-essay converter, consumed as an opaque function.
/// Failures are per-record; the conversion stage isolates them.
pub trait Converter {
    fn convert(&self, text: &str) -> Result<Essay>;
}
