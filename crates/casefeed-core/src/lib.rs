//! Core types and trait definitions for the casefeed ingestion pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The parsers, the store backend and the fetch orchestrator all depend on
//! it; it depends on nothing else in the workspace.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod date;
pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
