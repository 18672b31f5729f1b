//! Core identifier types shared across the adapter.

pub mod types;
