#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Silo infrastructure crates.
//!
//! * [`macro@silo_error`] turns a plain enum into a context-aware `thiserror` error.
//! * [`macro@main`] boots an `async fn main` on a [`silo_runtime`] profile.
//!
//! The examples are `ignore`d because they need the consuming crates in scope.
//!
//! [`silo_runtime`]: https://docs.rs/silo-runtime

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap a Tokio runtime from a named profile.
///
/// Rewrites `async fn main` into a synchronous `fn main` that builds the runtime
/// through `silo_runtime::build_runtime_with_config` and blocks on the body.
///
/// # Profiles
///
/// * `cooperative` - a single-threaded scheduler; every task interleaves on one thread.
/// * `high_performance` - multi-threaded, tuned for throughput.
/// * `memory_efficient` - multi-threaded with half the workers and smaller stacks.
/// * `default` - multi-threaded with auto-detected workers.
///
/// # Examples
///
/// ```rust,ignore
/// #[silo_runtime::main(cooperative)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for domain error enums.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * A `<Name>Ext` trait with `.context(...)`, implemented for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant that wraps a source error.
/// * `From<Source>` for every such variant, so `?` works on upstream errors.
/// * `From<&'static str>` / `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper for use inside `#[error(...)]` strings.
///
/// # Requirements
///
/// Variants must use named fields. A variant with a `source` field (or a field marked
/// `#[source]`/`#[from]`) must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[silo_derive::silo_error]
/// pub enum StorageError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Invalid path{}: {message}", format_context(.context))]
///     InvalidPath { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn open(path: &std::path::Path) -> Result<std::fs::File, StorageError> {
///     std::fs::File::open(path).context("Opening staged file")
/// }
/// ```
#[proc_macro_attribute]
pub fn silo_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
