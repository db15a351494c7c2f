//! Common imports for feature slices.

pub use crate::domain::config::ApiConfig;
pub use crate::domain::registry::{FeatureSlice, InitializedSlice};
pub use crate::domain::scopes::ScopeSet;

#[cfg(feature = "server")]
pub use crate::server::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResult, ApiState, ApiStateError, Problem,
};
