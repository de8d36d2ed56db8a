//! Flutter bridge crate for the Namebook core.
//!
//! Exposes `api` to flutter_rust_bridge codegen; no business logic lives here.

pub mod api;
