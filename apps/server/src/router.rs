use axum::Router;
use axum::middleware;
use modhub::features::identity::BearerSecurity;
use modhub::features::{identity, modules};
use modhub::kernel::prelude::ApiState;
use modhub::kernel::server::problem_instance;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(
    info(title = "ModuleHub API", description = "Module lifecycle management over REST"),
    modifiers(&BearerSecurity),
    tags(
        (name = "System", description = "Service health"),
        (name = "Identity", description = "Bearer token issuance"),
        (name = "Modules", description = "Module listing and lifecycle operations"),
    )
)]
struct ApiDoc;

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let (api_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(modhub::server::router::system_router())
        .merge(identity::router(&state))
        .merge(modules::router(&state))
        .layer(middleware::from_fn(problem_instance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    Router::new().merge(api_routes).merge(Scalar::with_url("/api", api_doc))
}
