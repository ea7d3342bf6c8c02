//! Chart engine interface
//!
//! The astrology engine is an external collaborator. The core only needs two
//! synchronous operations from it and never holds on to engine internals.

use super::snapshot::{ChartSnapshot, InterpretScope, TransitDate, TransitOverlay};
use crate::error::ZiweiResult;
use serde::{Deserialize, Serialize};

/// Birth parameters handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthParams {
    /// Solar calendar date, ISO `YYYY-MM-DD`
    pub solar_date: String,
    /// Birth hour, 0-23
    pub hour: u8,
    pub gender: Option<String>,
}

/// Computes charts and transit overlays from plain data
pub trait ChartEngine: Send + Sync {
    /// Compute a natal chart for the given birth parameters
    fn compute_chart(&self, params: &BirthParams) -> ZiweiResult<ChartSnapshot>;

    /// Compute the transit overlay for a chart, scope, and date
    fn compute_transit(
        &self,
        chart: &ChartSnapshot,
        scope: InterpretScope,
        date: &TransitDate,
    ) -> ZiweiResult<TransitOverlay>;
}
