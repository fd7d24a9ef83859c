//! Declarative validation engine.
//!
//! Rule expressions are parsed into rulesets, resolved against a per-validator
//! registry, and applied to value trees by the walker. Pure logic; no I/O.

pub mod engine;
mod evaluator;
pub mod parser;
pub mod registry;
pub mod rules;
pub mod schema;
mod walker;
