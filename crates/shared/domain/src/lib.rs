//! # Domain Models
//!
//! Pure data shared by every `ModuleHub` crate: typed configuration, token scopes,
//! `OpenAPI` tags and the feature slice registry.
//! Depends on `serde` and `bitflags` only; no I/O, networking or business rules here.

pub mod config;
pub mod constants;
pub mod registry;
pub mod scopes;
