mod error;
mod health;
mod objects;
pub mod router;
mod state;

pub use error::{ApiError, ApiErrorExt};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
