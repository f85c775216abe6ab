//! Flutter-facing bindings over `todolist_core`.

pub mod api;
