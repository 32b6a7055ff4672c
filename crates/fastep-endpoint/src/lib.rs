//! # fastep-endpoint — Endpoint Pipeline
//!
//! An [`Endpoint`] bundles a handler with the schemas and callbacks that
//! surround it. Calling it runs, in order:
//!
//! 1. permission gates (`403 Not enough permissions` on refusal),
//! 2. request validation against the attached [`Schema`](fastep_schema::Schema),
//! 3. middleware,
//! 4. the handler,
//! 5. response shaping against the attached [`Response`](fastep_schema::Response),
//! 6. post handlers.
//!
//! The first [`StructuredError`](fastep_core::StructuredError) ends the call.
//! Route registration and transport stay with the host; [`http`] only maps
//! outcomes onto axum responses.

pub mod endpoint;
pub mod http;

pub use endpoint::Endpoint;
pub use http::{into_response, ErrorResponse};
