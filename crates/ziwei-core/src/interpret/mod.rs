//! Interpretation pipeline: prompt assembly and request orchestration

pub mod prompt;
pub mod service;

pub use prompt::build_prompt;
pub use service::{Interpretation, Interpreter, InterpreterBuilder, InterpretRequest};
