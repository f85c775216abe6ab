//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define the task record persisted by the store and rendered by the UI.
//! - Define the form input used by create/edit flows.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
