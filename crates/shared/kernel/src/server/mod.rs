//! Axum plumbing shared by the feature slices.

mod error;
mod extract;
mod health;
mod problem;
pub mod router;
mod state;

pub use error::{ApiError, ApiErrorExt, ApiResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use health::mark_started;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, problem_instance};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
