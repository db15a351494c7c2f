use crate::Modules;
use crate::dto::{
    BulkStatusRequest, ModuleInfoDto, ModuleListQuery, ModuleListResponse, ModuleStatusRequest,
    ResetRequest,
};
use crate::error::ModuleError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use modhub_derive::api_handler;
use modhub_domain::constants::MODULES_TAG;
use modhub_identity::Principal;
use modhub_kernel::server::{ApiJson, ApiPath, ApiQuery, ApiResult, ApiState, Problem};
use tracing::{info, instrument};

#[api_handler(
    get,
    path = "/modules",
    params(ModuleListQuery),
    responses(
        (status = OK, description = "Matching modules", body = ModuleListResponse),
        (status = BAD_REQUEST, description = "Invalid filter or paging",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Missing or invalid token",
            body = Problem, content_type = "application/problem+json"),
        (status = FORBIDDEN, description = "Token lacks module_read",
            body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer" = ["module_read"])),
    tag = MODULES_TAG,
)]
pub(crate) async fn list_modules(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ModuleListQuery>,
) -> ApiResult<Json<ModuleListResponse>> {
    let modules = state.try_get_slice::<Modules>()?;
    let (filter, pagination) = query.into_parts();
    let page = modules.registry.list(&filter, pagination)?;

    Ok(Json(page.into()))
}

#[api_handler(
    get,
    path = "/module/{technicalName}",
    params(("technicalName" = String, Path, description = "Module technical name")),
    responses(
        (status = OK, description = "Module found", body = ModuleInfoDto),
        (status = NOT_FOUND, description = "Unknown module",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Missing or invalid token",
            body = Problem, content_type = "application/problem+json"),
        (status = FORBIDDEN, description = "Token lacks module_read",
            body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer" = ["module_read"])),
    tag = MODULES_TAG,
)]
pub(crate) async fn get_module(
    State(state): State<ApiState>,
    ApiPath(technical_name): ApiPath<String>,
) -> ApiResult<Json<ModuleInfoDto>> {
    let modules = state.try_get_slice::<Modules>()?;
    let info = modules.registry.get(&technical_name)?;

    Ok(Json(info.into()))
}

#[api_handler(
    put,
    path = "/module/{technicalName}/status",
    params(("technicalName" = String, Path, description = "Module technical name")),
    request_body = ModuleStatusRequest,
    responses(
        (status = OK, description = "Status applied", body = ModuleInfoDto),
        (status = BAD_REQUEST, description = "Malformed body or module not installed",
            body = Problem, content_type = "application/problem+json"),
        (status = NOT_FOUND, description = "Unknown module",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Missing or invalid token",
            body = Problem, content_type = "application/problem+json"),
        (status = FORBIDDEN, description = "Token lacks module_read or module_write",
            body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer" = ["module_read", "module_write"])),
    tag = MODULES_TAG,
)]
#[instrument(skip_all, fields(subject = %principal.subject, technical_name = %technical_name))]
pub(crate) async fn update_module_status(
    State(state): State<ApiState>,
    principal: Principal,
    ApiPath(technical_name): ApiPath<String>,
    ApiJson(request): ApiJson<ModuleStatusRequest>,
) -> ApiResult<Json<ModuleInfoDto>> {
    let modules = state.try_get_slice::<Modules>()?;
    let info = modules.registry.set_enabled(&technical_name, request.enabled)?;

    info!(enabled = info.enabled, "Module status updated");
    Ok(Json(info.into()))
}

#[api_handler(
    put,
    path = "/modules/toggle-status",
    request_body = BulkStatusRequest,
    responses(
        (status = NO_CONTENT, description = "Status applied to every module"),
        (status = BAD_REQUEST, description = "Empty list, malformed body or module not installed",
            body = Problem, content_type = "application/problem+json"),
        (status = NOT_FOUND, description = "At least one unknown module; nothing changed",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Missing or invalid token",
            body = Problem, content_type = "application/problem+json"),
        (status = FORBIDDEN, description = "Token lacks module_write",
            body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer" = ["module_write"])),
    tag = MODULES_TAG,
)]
#[instrument(skip_all, fields(subject = %principal.subject, enabled = request.enabled))]
pub(crate) async fn bulk_update_status(
    State(state): State<ApiState>,
    principal: Principal,
    ApiJson(request): ApiJson<BulkStatusRequest>,
) -> ApiResult<StatusCode> {
    let modules = state.try_get_slice::<Modules>()?;
    let changed = modules.registry.set_enabled_bulk(&request.modules, request.enabled)?;

    info!(requested = request.modules.len(), changed, "Bulk status updated");
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    patch,
    path = "/module/{technicalName}/reset",
    params(("technicalName" = String, Path, description = "Module technical name")),
    request_body(
        content = Option<ResetRequest>,
        description = "Optional; `keepData` defaults to false"
    ),
    responses(
        (status = OK, description = "Module reinstalled with a new identity",
            body = ModuleInfoDto),
        (status = BAD_REQUEST, description = "Module not enabled or malformed body",
            body = Problem, content_type = "application/problem+json"),
        (status = NOT_FOUND, description = "Unknown module",
            body = Problem, content_type = "application/problem+json"),
        (status = UNAUTHORIZED, description = "Missing or invalid token",
            body = Problem, content_type = "application/problem+json"),
        (status = FORBIDDEN, description = "Token lacks module_read or module_write",
            body = Problem, content_type = "application/problem+json"),
    ),
    security(("bearer" = ["module_read", "module_write"])),
    tag = MODULES_TAG,
)]
#[instrument(skip_all, fields(subject = %principal.subject, technical_name = %technical_name))]
pub(crate) async fn reset_module(
    State(state): State<ApiState>,
    principal: Principal,
    ApiPath(technical_name): ApiPath<String>,
    body: Bytes,
) -> ApiResult<Json<ModuleInfoDto>> {
    let request = parse_reset_body(&body)?;
    let modules = state.try_get_slice::<Modules>()?;
    let info = modules.registry.reset(&technical_name, request.keep_data)?;

    info!(module_id = info.module_id, keep_data = request.keep_data, "Module reset");
    Ok(Json(info.into()))
}

/// An absent or blank body means the defaults.
fn parse_reset_body(body: &[u8]) -> Result<ResetRequest, ModuleError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResetRequest::default());
    }
    serde_json::from_slice(body).map_err(|err| ModuleError::InvalidInput {
        message: format!("Invalid reset body: {err}").into(),
        context: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reset_body_uses_defaults() {
        assert!(!parse_reset_body(b"").expect("empty").keep_data);
        assert!(!parse_reset_body(b" \n").expect("blank").keep_data);
        assert!(!parse_reset_body(b"{}").expect("object").keep_data);
    }

    #[test]
    fn reset_body_is_parsed() {
        assert!(parse_reset_body(br#"{"keepData": true}"#).expect("json").keep_data);
    }

    #[test]
    fn malformed_reset_body_is_rejected() {
        for body in [&b"{"[..], br#"{"keepData": "yes"}"#, br#"{"keep_data": true}"#] {
            assert!(matches!(parse_reset_body(body), Err(ModuleError::InvalidInput { .. })));
        }
    }
}
