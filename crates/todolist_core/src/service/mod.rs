//! Use-case layer over the task repository.
//!
//! # Responsibility
//! - `task_store`: the filtered, sorted task view and its mutations.
//! - `presenter`: seeding decisions and view notifications.

pub mod presenter;
pub mod task_store;
