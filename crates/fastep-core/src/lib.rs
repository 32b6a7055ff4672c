//! # fastep-core — Foundational Types for fastep
//!
//! This crate defines the values that cross the boundary between the schema
//! pipeline and whatever hosts it. Every other crate in the workspace depends
//! on `fastep-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One error record.** [`StructuredError`] is the only value handed back
//!    to REST callers when data is rejected. Its serialized shape is
//!    `{code, message, data: {status, all_messages?}}` and never varies.
//!
//! 2. **Ordered messages.** [`FieldMessages`] keeps failing paths in the order
//!    the validator reported them, so error bodies are reproducible.
//!
//! 3. **Hooks are owned, not global.** [`Filter`] is an ordered list of typed
//!    callbacks owned by the component that runs them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fastep-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod hooks;
pub mod messages;
pub mod request;

// Re-export primary types for ergonomic imports.
pub use error::{ErrorData, Outcome, StructuredError, INTERNAL_SERVER_ERROR, UNPROCESSABLE_ENTITY};
pub use hooks::Filter;
pub use messages::FieldMessages;
pub use request::Request;
