use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use http_body_util::BodyExt;
use modhub_domain::config::{ApiConfig, ClientConfig, JwtConfig};
use modhub_domain::scopes::ScopeSet;
use modhub_identity::guard::guarded;
use modhub_identity::{Identity, Principal};
use modhub_kernel::server::ApiState;
use serde_json::{Value, json};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

fn state() -> ApiState {
    let mut config = ApiConfig::default();
    config.security.identity.jwt =
        JwtConfig { secret: "integration-secret-0123456789".to_owned(), ..JwtConfig::default() };
    config.security.identity.clients = vec![
        ClientConfig {
            client_id: "back-office".to_owned(),
            client_secret: "bo-secret".to_owned(),
            scopes: ScopeSet::ALL,
        },
        ClientConfig {
            client_id: "reader".to_owned(),
            client_secret: "reader-secret".to_owned(),
            scopes: ScopeSet::MODULE_READ,
        },
    ];

    let slice = modhub_identity::init(&config).expect("identity slice");
    ApiState::builder().config(config).register_slice(slice).build().expect("state")
}

async fn whoami(principal: Principal) -> String {
    principal.subject
}

fn app(state: &ApiState) -> Router {
    let protected = guarded(
        OpenApiRouter::new().route("/secret", get(whoami)),
        state,
        ScopeSet::MODULE_WRITE,
    );
    let (router, _) = modhub_identity::router(state)
        .merge(protected)
        .with_state(state.clone())
        .split_for_parts();
    router
}

async fn request_token(app: Router, body: Value) -> Response {
    let request = Request::post("/access-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.oneshot(request).await.expect("response")
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn grants_all_allowed_scopes_by_default() {
    let state = state();
    let response =
        request_token(app(&state), json!({"clientId": "back-office", "clientSecret": "bo-secret"}))
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["scope"], "module_read module_write");
    assert_eq!(body["expiresIn"], 3600);
    assert!(body["accessToken"].as_str().is_some_and(|t| t.split('.').count() == 3));
}

#[tokio::test]
async fn grants_intersection_of_requested_and_allowed() {
    let state = state();
    let response = request_token(
        app(&state),
        json!({
            "clientId": "reader",
            "clientSecret": "reader-secret",
            "scope": "module_read module_write"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["scope"], "module_read");
}

#[tokio::test]
async fn nothing_grantable_is_bad_request() {
    let state = state();
    let response = request_token(
        app(&state),
        json!({"clientId": "reader", "clientSecret": "reader-secret", "scope": "module_write"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let state = state();
    let response =
        request_token(app(&state), json!({"clientId": "reader", "clientSecret": "nope"})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["status"], 401);
}

#[tokio::test]
async fn guard_checks_token_and_scope() {
    let state = state();
    let identity = state.try_get_slice::<Identity>().expect("identity");
    let writer = identity.tokens.issue("back-office", ScopeSet::ALL).expect("token");
    let reader = identity.tokens.issue("reader", ScopeSet::MODULE_READ).expect("token");

    let call = |token: Option<String>| {
        let app = app(&state);
        async move {
            let mut request = Request::get("/secret");
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            app.oneshot(request.body(Body::empty()).expect("request")).await.expect("response")
        }
    };

    let anonymous = call(None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.headers()[header::WWW_AUTHENTICATE], "Bearer");

    assert_eq!(call(Some("garbage".to_owned())).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(call(Some(reader.access_token)).await.status(), StatusCode::FORBIDDEN);

    let allowed = call(Some(writer.access_token)).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    let bytes = allowed.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], b"back-office");
}

#[test]
fn missing_or_weak_secret_fails_init() {
    let mut config = ApiConfig::default();
    assert!(modhub_identity::init(&config).is_err(), "default config has no signing key");

    config.security.identity.jwt.secret = "short".to_owned();
    assert!(modhub_identity::init(&config).is_err());

    config.security.identity.jwt.secret = "integration-secret-0123456789".to_owned();
    assert!(modhub_identity::init(&config).is_ok());
}
