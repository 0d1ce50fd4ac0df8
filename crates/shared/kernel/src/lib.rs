//! Service layer shared by Silo binaries.
//!
//! * [`config`] loads [`domain::config::ApiConfig`] from an optional file plus `SILO__*`
//!   environment overrides.
//! * `server` (feature `server`, on by default) is the HTTP surface: application state,
//!   handlers for hashed uploads and direct writes, static serving of stored objects, and a
//!   health probe. Handlers only translate HTTP into `silo-storage` calls.
//!
//! ```rust,ignore
//! use silo_kernel::server::{ApiState, router};
//!
//! let state = ApiState::builder().config(cfg).storage(storage).build()?;
//! let app = router::api_router(state);
//! ```

pub mod config;
#[cfg(feature = "server")]
pub mod server;

pub use silo_domain as domain;
#[cfg(feature = "server")]
pub use silo_storage as storage;
