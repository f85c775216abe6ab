//! Remote seed list used to populate an empty store.
//!
//! # Responsibility
//! - Describe the remote todo list payload.
//! - Fetch it with one GET and map items into tasks.
//!
//! # Invariants
//! - No retry, no pagination beyond the first page.

pub mod fetcher;
pub mod wire;
