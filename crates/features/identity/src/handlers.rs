use crate::Identity;
use crate::error::IdentityError;
use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use modhub_derive::{api_handler, api_model};
use modhub_domain::constants::{BEARER, IDENTITY_TAG};
use modhub_domain::scopes::ScopeSet;
use modhub_kernel::server::{ApiJson, ApiResult, ApiState, Problem};
use tracing::{info, instrument};

#[api_model]
/// Client-credentials grant.
pub struct AccessTokenRequest {
    /// Registered client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Space separated scopes; every allowed scope when omitted.
    #[serde(default)]
    pub scope: Option<String>,
}

#[api_model]
/// Issued bearer token.
pub struct AccessTokenResponse {
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Granted scopes, space separated.
    pub scope: String,
}

#[api_handler(
    post,
    path = "/access-token",
    request_body = AccessTokenRequest,
    responses(
        (status = OK, description = "Token issued", body = AccessTokenResponse),
        (status = BAD_REQUEST, description = "Malformed request or no grantable scope",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Unknown client or wrong secret",
            body = Problem, content_type = "application/problem+json"),
    ),
    tag = IDENTITY_TAG,
)]
#[instrument(skip_all, fields(client_id = %request.client_id))]
pub(crate) async fn access_token_handler(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<AccessTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.try_get_slice::<Identity>()?;
    let allowed = identity.clients.authenticate(&request.client_id, &request.client_secret)?;

    let granted = match request.scope.as_deref().map(str::trim) {
        None | Some("") => allowed,
        Some(requested) => {
            let granted = ScopeSet::parse(requested) & allowed;
            if granted.is_empty() {
                return Err(IdentityError::InvalidScope {
                    message: format!("None of '{requested}' can be granted").into(),
                    context: None,
                }
                .into());
            }
            granted
        }
    };

    let issued = identity.tokens.issue(&request.client_id, granted)?;
    info!(scope = %issued.scopes, "Access token granted");

    let body = AccessTokenResponse {
        access_token: issued.access_token,
        token_type: BEARER.to_owned(),
        expires_in: issued.expires_in,
        scope: issued.scopes.to_scope_string(),
    };
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(body)))
}
