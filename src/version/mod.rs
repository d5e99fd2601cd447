//! Tag ordering
//!
//! - [`compare`]: Debian-style comparison used to sort tags newest first

pub mod compare;

pub use compare::{compare_versions, sort_descending};
