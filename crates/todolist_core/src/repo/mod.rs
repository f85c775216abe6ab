//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for tasks.
//! - Isolate SQLite query details from the store/presenter layers.
//!
//! # Invariants
//! - Repository writes enforce `Task::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   storage errors.

pub mod task_repo;
