//! Chart domain types and the engine interface

pub mod engine;
pub mod snapshot;

pub use engine::{BirthParams, ChartEngine};
pub use snapshot::{
    BirthInfo, ChartSnapshot, InterpretScope, Palace, SNAPSHOT_VERSION, Star, TransitActivation,
    TransitDate, TransitOverlay,
};
