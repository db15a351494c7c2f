//! Bearer token authentication and scope checks, applied as route middleware.

use crate::Identity;
use crate::error::IdentityError;
use crate::tokens::Principal;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use modhub_domain::constants::BEARER;
use modhub_domain::scopes::ScopeSet;
use modhub_kernel::server::{ApiError, ApiState};
use tracing::{debug, warn};
use utoipa_axum::router::OpenApiRouter;

/// Middleware state: where to find the token verifier and what the route needs.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    state: ApiState,
    required: ScopeSet,
}

impl ScopeGuard {
    #[must_use]
    pub fn new(state: &ApiState, required: ScopeSet) -> Self {
        Self { state: state.clone(), required }
    }
}

/// Rejects requests without a valid bearer token (`401`) or without every required
/// scope (`403`); otherwise stores the [`Principal`] in the request extensions.
///
/// # Errors
/// Returns the problem response describing the failed check.
pub async fn require_scopes(
    State(guard): State<ScopeGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let identity = guard.state.try_get_slice::<Identity>()?;
    let principal = identity.tokens.verify(token)?;

    let missing = guard.required - principal.scopes;
    if !missing.is_empty() {
        warn!(subject = %principal.subject, %missing, "Request rejected: insufficient scope");
        return Err(IdentityError::InsufficientScope {
            message: format!("Token lacks required scope: {missing}").into(),
            context: None,
        }
        .into());
    }

    debug!(subject = %principal.subject, scopes = %principal.scopes, "Request authorized");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Protects every route of `router` with [`require_scopes`].
pub fn guarded(
    router: OpenApiRouter<ApiState>,
    state: &ApiState,
    required: ScopeSet,
) -> OpenApiRouter<ApiState> {
    let guard = ScopeGuard::new(state, required);
    router.route_layer(middleware::from_fn_with_state(guard, require_scopes))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let invalid = |message: &'static str| IdentityError::InvalidToken {
        message: message.into(),
        context: None,
    };

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| invalid("Missing bearer token"))?
        .to_str()
        .map_err(|_| invalid("Authorization header is not valid text"))?;

    let (scheme, token) =
        value.split_once(' ').ok_or_else(|| invalid("Malformed authorization header"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() {
        return Err(invalid("Malformed authorization header"));
    }
    Ok(token)
}

/// Handlers behind [`require_scopes`] can take the caller as an argument.
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Route is not protected by a scope guard"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer abc.def")).expect("token"), "abc.def");
        assert_eq!(bearer_token(&headers("Bearer  abc")).expect("token"), "abc");
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(bearer_token(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(bearer_token(&headers("Bearer")).is_err());
        assert!(bearer_token(&headers("Bearer   ")).is_err());
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }
}
