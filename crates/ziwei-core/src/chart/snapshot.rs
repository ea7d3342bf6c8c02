//! Versioned chart snapshot types
//!
//! The interpretation core owns this representation outright. The chart
//! engine's native result object is converted into a [`ChartSnapshot`] at the
//! boundary and treated as plain data from then on; transit overlays are
//! produced by explicit recomputation, never by reviving a serialized engine
//! handle.

use crate::error::{ZiweiError, ZiweiResult};
use serde::{Deserialize, Serialize};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A complete natal chart, frozen as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    /// Schema version, bumped on incompatible shape changes
    pub version: u32,
    /// Stable identifier assigned when the chart was first computed
    pub chart_id: String,
    pub birth: BirthInfo,
    /// The twelve palaces in chart order
    pub palaces: Vec<Palace>,
}

impl ChartSnapshot {
    /// Create a snapshot at the current schema version
    pub fn new(chart_id: impl Into<String>, birth: BirthInfo, palaces: Vec<Palace>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            chart_id: chart_id.into(),
            birth,
            palaces,
        }
    }

    /// Reject snapshots this build cannot interpret
    pub fn validate(&self) -> ZiweiResult<()> {
        if self.version > SNAPSHOT_VERSION {
            return Err(ZiweiError::invalid_input(format!(
                "unsupported chart snapshot version {} (this build understands <= {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.chart_id.trim().is_empty() {
            return Err(ZiweiError::invalid_input("chart snapshot has no chart id"));
        }
        if self.palaces.is_empty() {
            return Err(ZiweiError::invalid_input("chart snapshot has no palaces"));
        }
        Ok(())
    }
}

/// Birth parameters echoed into the snapshot for prompt assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInfo {
    /// Solar calendar date, ISO `YYYY-MM-DD`
    pub solar_date: String,
    /// Lunar calendar date as rendered by the engine, if available
    pub lunar_date: Option<String>,
    /// Earthly branch of the birth hour
    pub hour_branch: String,
    pub gender: Option<String>,
}

/// One palace with its seated stars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palace {
    pub name: String,
    /// Earthly branch of the palace position
    pub branch: String,
    /// Heavenly stem of the palace position
    pub stem: String,
    pub stars: Vec<Star>,
}

/// A star placement within a palace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub name: String,
    /// Brightness grade, when the engine assigns one
    pub brightness: Option<String>,
    /// Four-transformation tag (hua lu / quan / ke / ji), when present
    pub mutagen: Option<String>,
}

/// Time horizon an interpretation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretScope {
    Natal,
    Decade,
    Year,
    Month,
    Day,
}

impl InterpretScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Natal => "natal",
            Self::Decade => "decade",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }
}

impl std::fmt::Display for InterpretScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date fields for transit scopes. Granularity requirements depend on the
/// scope: a yearly reading needs a year, a daily reading needs all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl TransitDate {
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Default::default()
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: None,
        }
    }

    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
        }
    }

    /// Check that the fields this scope requires are present and in range
    pub fn validate_for(&self, scope: InterpretScope) -> ZiweiResult<()> {
        let needs_year = !matches!(scope, InterpretScope::Natal);
        let needs_month = matches!(scope, InterpretScope::Month | InterpretScope::Day);
        let needs_day = matches!(scope, InterpretScope::Day);

        if needs_year && self.year.is_none() {
            return Err(ZiweiError::invalid_input(format!(
                "scope '{scope}' requires a year"
            )));
        }
        if needs_month && self.month.is_none() {
            return Err(ZiweiError::invalid_input(format!(
                "scope '{scope}' requires a month"
            )));
        }
        if needs_day && self.day.is_none() {
            return Err(ZiweiError::invalid_input(format!(
                "scope '{scope}' requires a day"
            )));
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ZiweiError::invalid_input(format!("month {month} out of range")));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Err(ZiweiError::invalid_input(format!("day {day} out of range")));
            }
        }
        Ok(())
    }
}

/// Transit activations layered over a natal chart for a scope and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitOverlay {
    pub scope: InterpretScope,
    pub date: TransitDate,
    pub activations: Vec<TransitActivation>,
}

/// One palace touched by the transit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitActivation {
    pub palace: String,
    pub stars: Vec<String>,
    pub note: Option<String>,
}
