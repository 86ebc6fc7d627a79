//! Deterministic, pure middleware logic.
//!
//! Core modules are free of I/O. They operate on in-memory argument maps and
//! chain arenas and are fully testable in isolation.

pub mod chain;
pub mod context;
pub mod guard;
pub mod reference;
pub mod value;
