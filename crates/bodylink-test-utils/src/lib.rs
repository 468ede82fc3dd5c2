//! Mock model and transport backends plus shared test fixtures.
//!
//! Everything here is deterministic and in-memory: the mock transport keeps
//! per-joint state behind a mutex and counts session opens and closes, which
//! is what the lifecycle tests assert on.

pub mod fixtures;
pub mod mocks;
