//! Identity feature slice.
//!
//! * `POST /access-token` issues HS256 bearer tokens to configured API clients.
//! * [`guard::guarded`] protects feature routes with the scopes a token must carry.

mod clients;
mod error;
pub mod guard;
mod handlers;
mod tokens;

pub use crate::clients::ClientRegistry;
pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::tokens::{Claims, IssuedToken, Principal, TokenService};

use modhub_domain::config::ApiConfig;
use modhub_domain::constants::BEARER;
use modhub_kernel::domain::registry::InitializedSlice;
use modhub_kernel::server::ApiState;
use utoipa::Modify;
use utoipa::openapi::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Name of the `OpenAPI` security scheme referenced by protected handlers.
pub const SECURITY_SCHEME: &str = "bearer";

/// Identity feature state.
#[modhub_derive::modhub_slice]
pub struct Identity {
    pub tokens: TokenService,
    pub clients: ClientRegistry,
}

/// Builds the identity slice from the `security.identity` configuration.
///
/// # Errors
/// Returns [`IdentityError::Config`] for a weak signing setup or invalid clients.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, IdentityError> {
    let identity = &config.security.identity;
    let tokens = TokenService::new(&identity.jwt).context("Configuring token service")?;
    let clients = ClientRegistry::new(&identity.clients).context("Registering API clients")?;

    if clients.is_empty() {
        tracing::warn!("No API clients configured; /access-token will reject every request");
    }
    tracing::info!(
        clients = clients.len(),
        ttl_seconds = tokens.ttl_seconds(),
        "Identity slice initialized"
    );

    Ok(InitializedSlice::new(Identity::new(IdentityInner { tokens, clients })))
}

/// Public token endpoint.
pub fn router(_state: &ApiState) -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(handlers::access_token_handler))
}

/// Registers the bearer scheme in the `OpenAPI` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut OpenApi) {
        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some(format!("{BEARER} token from POST /access-token")))
            .build();
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(SECURITY_SCHEME, SecurityScheme::Http(scheme));
    }
}
