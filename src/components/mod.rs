//! Leptos components.

pub mod graph_explorer;
