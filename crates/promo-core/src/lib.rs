//! Core types and workflow for the promotions reward-request service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PromoStore`]; the HTTP layer drives
//! [`orchestrator::RequestOrchestrator`] and [`catalog::Catalog`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod condition;
pub mod error;
pub mod event;
pub mod history;
pub mod orchestrator;
pub mod request;
pub mod reward;
pub mod store;

pub use error::{Error, ErrorKind, Result};
