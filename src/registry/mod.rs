//! Registry access layer
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │  Registry    │◀────│ FeedBuilder  │
//! │   (trait)    │     └──────────────┘
//! └──────────────┘
//!        ▲
//! ┌──────────────┐     ┌──────────────┐
//! │RegistryClient│────▶│ManifestCache │
//! │  (reqwest)   │     │(digest-keyed)│
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`client`]: HTTP client for the registry v2 API, including token login
//!   and the concurrent manifest fan-out
//! - [`cache`]: Manifest cache validated against the registry's content digest
//! - [`pattern`]: Regex-based tag selection
//! - [`traits`]: `Registry` trait consumed by the feed builder
//! - [`types`]: Wire types and fetch results

pub mod cache;
pub mod client;
pub mod pattern;
pub mod traits;
pub mod types;

pub use client::RegistryClient;
pub use traits::Registry;
pub use types::{ManifestBatch, TagDigest, TagFailure};
