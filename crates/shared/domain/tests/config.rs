use modhub_domain::config::{ApiConfig, JwtConfig, LoggingConfig, ServerConfig};
use modhub_domain::scopes::ScopeSet;
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8080);
    assert!(server.ssl.is_none());

    let jwt = JwtConfig::default();
    assert!(jwt.secret.is_empty(), "no signing key may ship as a default");
    assert_eq!(jwt.issuer, "modhub");
    assert_eq!(jwt.ttl_seconds, 3600);

    assert_eq!(LoggingConfig::default().level, "info");
    assert!(ApiConfig::default().modules.catalog.is_empty());
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 9000 },
        "security": {
            "identity": {
                "jwt": { "secret": "s3cr3t", "issuer": "shop" },
                "clients": [
                    { "client_id": "back-office", "client_secret": "pw", "scopes": ["module_read", "module_write"] },
                    { "client_id": "reader", "client_secret": "pw", "scopes": "module_read" }
                ]
            }
        },
        "modules": {
            "catalog": [
                { "technical_name": "ps_apiresources", "version": "0.1.0", "settings": { "cache": "on" } },
                { "technical_name": "ps_legacy", "version": "1.2.3", "installed": false, "enabled": false }
            ]
        }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.security.identity.jwt.issuer, "shop");
    assert_eq!(cfg.security.identity.jwt.ttl_seconds, 3600);

    let clients = &cfg.security.identity.clients;
    assert_eq!(clients[0].scopes, ScopeSet::ALL);
    assert_eq!(clients[1].scopes, ScopeSet::MODULE_READ);

    let catalog = &cfg.modules.catalog;
    assert!(catalog[0].installed && catalog[0].enabled);
    assert_eq!(catalog[0].settings.get("cache").map(String::as_str), Some("on"));
    assert!(!catalog[1].installed);
}

#[test]
fn debug_output_hides_secrets() {
    let raw = json!({
        "security": {
            "identity": {
                "jwt": { "secret": "top-secret" },
                "clients": [{ "client_id": "c", "client_secret": "hunter2" }]
            }
        }
    });
    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    let printed = format!("{cfg:?}");

    assert!(!printed.contains("top-secret"));
    assert!(!printed.contains("hunter2"));
    assert!(printed.contains("<redacted>"));
}
