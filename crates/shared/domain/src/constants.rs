//! String constants shared between crates.

/// `OpenAPI` tag for infrastructure endpoints.
pub const SYSTEM_TAG: &str = "System";
/// `OpenAPI` tag for token issuance.
pub const IDENTITY_TAG: &str = "Identity";
/// `OpenAPI` tag for module management.
pub const MODULES_TAG: &str = "Modules";

/// Scope granting read access to modules.
pub const MODULE_READ: &str = "module_read";
/// Scope granting state changes on modules.
pub const MODULE_WRITE: &str = "module_write";

/// Scheme used in `Authorization` and `WWW-Authenticate` headers.
pub const BEARER: &str = "Bearer";
