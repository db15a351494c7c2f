//! Modules feature slice.
//!
//! Keeps the registry of platform modules seeded from the configured catalog and
//! exposes listing, status toggles (single and bulk) and reset over REST. Every route
//! sits behind the identity scope guard:
//!
//! | Route | Scopes |
//! |---|---|
//! | `GET /modules`, `GET /module/{technicalName}` | `module_read` |
//! | `PUT /module/{technicalName}/status` | `module_read module_write` |
//! | `PATCH /module/{technicalName}/reset` | `module_read module_write` |
//! | `PUT /modules/toggle-status` | `module_write` |

mod dto;
mod error;
mod handlers;
pub mod model;
mod registry;

pub use crate::dto::{
    BulkStatusRequest, ModuleInfoDto, ModuleListQuery, ModuleListResponse, ModuleStatusRequest,
    ResetRequest,
};
pub use crate::error::{ModuleError, ModuleErrorExt};
pub use crate::registry::ModuleRegistry;

use modhub_domain::config::ApiConfig;
use modhub_domain::scopes::ScopeSet;
use modhub_identity::guard::guarded;
use modhub_kernel::domain::registry::InitializedSlice;
use modhub_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Modules feature state.
#[modhub_derive::modhub_slice]
pub struct Modules {
    pub registry: ModuleRegistry,
}

/// Builds the slice from `modules.catalog`.
///
/// # Errors
/// Returns [`ModuleError::Version`] or [`ModuleError::Catalog`] for an unusable catalog.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, ModuleError> {
    let registry =
        ModuleRegistry::from_catalog(&config.modules.catalog).context("Seeding module registry")?;
    tracing::info!(modules = registry.len(), "Modules slice initialized");

    Ok(InitializedSlice::new(Modules::new(ModulesInner { registry })))
}

/// Module routes, each group guarded by the scopes it needs.
pub fn router(state: &ApiState) -> OpenApiRouter<ApiState> {
    let read = OpenApiRouter::new()
        .routes(routes!(handlers::list_modules))
        .routes(routes!(handlers::get_module));

    let read_write = OpenApiRouter::new()
        .routes(routes!(handlers::update_module_status))
        .routes(routes!(handlers::reset_module));

    let write = OpenApiRouter::new().routes(routes!(handlers::bulk_update_status));

    guarded(read, state, ScopeSet::MODULE_READ)
        .merge(guarded(read_write, state, ScopeSet::MODULE_READ | ScopeSet::MODULE_WRITE))
        .merge(guarded(write, state, ScopeSet::MODULE_WRITE))
}
