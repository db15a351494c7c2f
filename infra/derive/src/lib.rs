#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by every crate of the workspace.
//!
//! * [`modhub_error`] turns an enum into a `thiserror` error with context support.
//! * [`api_model`] and [`api_handler`] keep REST DTOs and handlers consistent with `OpenAPI`.
//! * [`modhub_slice`] wraps feature state into a registrable, cheaply clonable handle.
//! * [`main`] boots an `async fn main` on a tuned Tokio runtime.
//!
//! The doc examples are `ignore`d because a proc-macro crate cannot use its own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap a tuned Tokio runtime.
///
/// Rewrites `async fn main` into a synchronous `fn main` that builds a runtime
/// from the selected `modhub_runtime::RuntimeConfig` preset and blocks on the body.
///
/// # Arguments
///
/// * `high_performance` - server workloads (bigger stacks, long keep-alive).
/// * `memory_efficient` - constrained environments.
/// * `default` or nothing - auto-detected worker count.
///
/// # Examples
///
/// ```rust,ignore
/// #[modhub_runtime::main(high_performance)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Declares a REST data transfer object.
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` unless already present.
/// * **Serde Policy**: `rename_all = "camelCase"` and `deny_unknown_fields` by default.
///
/// # Arguments
///
/// * `rename_all = "..."` - overrides the rename policy.
/// * `deny_unknown_fields = false` - accepts unknown fields.
///
/// # Example
///
/// ```rust,ignore
/// use modhub_derive::api_model;
///
/// #[api_model]
/// pub struct ModuleInfo {
///     pub module_id: u64,
///     pub technical_name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Registers an Axum handler with `utoipa::path`.
///
/// Accepts the regular `utoipa::path` arguments (`get`, `path = "..."`, `params(...)`,
/// `responses(...)`, `tag = ...`).
///
/// # Example
///
/// ```rust,ignore
/// use modhub_derive::api_handler;
///
/// #[api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> impl IntoResponse {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Declares a domain error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and for
///   `Result<T, SourceError>` of every variant carrying a source.
/// * `From<SourceError>` for variants with a source field.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper usable inside `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums with named-field variants are accepted.
/// 2. A `context` field must be `Option<Cow<'static, str>>`.
/// 3. A variant with a source (`source` field, `#[source]` or `#[from]`) must also have `context`.
///
/// # Example
///
/// ```rust,ignore
/// use modhub_derive::modhub_error;
/// use std::borrow::Cow;
///
/// #[modhub_error]
/// pub enum LoaderError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String, LoaderError> {
///     std::fs::read_to_string(path).context("Reading catalog")
/// }
/// ```
#[proc_macro_attribute]
pub fn modhub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_error(input).into()
}

/// Declares a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is generated as an
/// `Arc<<Name>Inner>` wrapper with `Deref`, `Clone`, `Debug` and a `FeatureSlice` impl.
///
/// # Example
/// ```rust,ignore
/// #[modhub_derive::modhub_slice]
/// pub struct Modules {
///     pub service: ModuleService,
/// }
///
/// let slice = Modules::new(ModulesInner { service });
/// ```
#[proc_macro_attribute]
pub fn modhub_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
