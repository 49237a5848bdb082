//! Request orchestration: resolve, plan, build, composite, annotate, encode.

pub mod engine;

pub use engine::{CompositeEngine, CompositeResult};
