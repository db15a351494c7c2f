use crate::error::{IdentityError, IdentityErrorExt};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use modhub_domain::config::JwtConfig;
use modhub_domain::scopes::ScopeSet;
use modhub_kernel::safe_nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const MIN_SECRET_LEN: usize = 16;

/// JWT payload of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iat: i64,
    pub exp: i64,
    /// Space separated scope names.
    #[serde(default)]
    pub scope: String,
    pub jti: String,
}

/// Who is calling, as proven by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub scopes: ScopeSet,
    pub token_id: String,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
    pub scopes: ScopeSet,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: Option<String>,
    ttl_seconds: u64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// # Errors
    /// Returns [`IdentityError::Config`] for a missing or short secret, an empty issuer or a
    /// zero TTL.
    pub fn new(config: &JwtConfig) -> Result<Self, IdentityError> {
        if config.secret.is_empty() {
            return Err(IdentityError::Config {
                message: "JWT secret is not configured".into(),
                context: Some("security.identity.jwt.secret".into()),
            });
        }
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(IdentityError::Config {
                message: format!("JWT secret must be at least {MIN_SECRET_LEN} bytes").into(),
                context: Some("security.identity.jwt.secret".into()),
            });
        }
        if config.issuer.trim().is_empty() || config.ttl_seconds == 0 {
            return Err(IdentityError::Config {
                message: "JWT issuer and ttl_seconds must be set".into(),
                context: Some("security.identity.jwt".into()),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.clock_skew_seconds;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    /// Signs a token for `subject` carrying `scopes`.
    ///
    /// # Errors
    /// Returns [`IdentityError::Signing`] when encoding fails.
    pub fn issue(&self, subject: &str, scopes: ScopeSet) -> Result<IssuedToken, IdentityError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            scope: scopes.to_scope_string(),
            jti: safe_nanoid!(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Encoding access token")?;
        debug!(subject, jti = %claims.jti, scope = %claims.scope, "Access token issued");

        Ok(IssuedToken { access_token, expires_in: self.ttl_seconds, scopes })
    }

    /// Verifies signature, issuer, audience and expiry, then resolves the scopes.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidToken`] for any token that fails validation.
    pub fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            let message = match err.kind() {
                ErrorKind::ExpiredSignature => "Token has expired",
                ErrorKind::InvalidSignature => "Token signature is invalid",
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    "Token was issued for another service"
                }
                _ => "Token is malformed",
            };
            IdentityError::InvalidToken { message: message.into(), context: None }
        })?;

        let claims = data.claims;
        Ok(Principal {
            subject: claims.sub,
            scopes: ScopeSet::parse(&claims.scope),
            token_id: claims.jti,
        })
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig { secret: "unit-test-secret-0123456789".to_owned(), ..JwtConfig::default() }
    }

    #[test]
    fn issued_token_verifies() {
        let service = TokenService::new(&config()).expect("service");
        let issued = service.issue("back-office", ScopeSet::ALL).expect("token");

        let principal = service.verify(&issued.access_token).expect("valid token");
        assert_eq!(principal.subject, "back-office");
        assert_eq!(principal.scopes, ScopeSet::ALL);
        assert_eq!(principal.token_id.len(), 12);
        assert_eq!(issued.expires_in, 3600);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let service = TokenService::new(&config()).expect("service");
        let other = TokenService::new(&JwtConfig {
            secret: "another-secret-abcdefghijklmnop".to_owned(),
            ..JwtConfig::default()
        })
        .expect("service");

        let token = other.issue("intruder", ScopeSet::ALL).expect("token").access_token;
        assert!(matches!(service.verify(&token), Err(IdentityError::InvalidToken { .. })));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(&config()).expect("service");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "old".to_owned(),
            iss: "modhub".to_owned(),
            aud: None,
            iat: now - 7200,
            exp: now - 3600,
            scope: "module_read".to_owned(),
            jti: "x".to_owned(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config().secret.as_bytes()),
        )
        .expect("encode");

        let err = service.verify(&token).expect_err("expired");
        assert_eq!(err.to_string(), "Invalid token: Token has expired");
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let scoped = JwtConfig { audience: Some("modules-api".to_owned()), ..config() };
        let with_aud = TokenService::new(&scoped).expect("service");
        let without_aud = TokenService::new(&config()).expect("service");

        let token = without_aud.issue("c", ScopeSet::MODULE_READ).expect("token").access_token;
        assert!(with_aud.verify(&token).is_err());

        let token = with_aud.issue("c", ScopeSet::MODULE_READ).expect("token").access_token;
        assert!(with_aud.verify(&token).is_ok());
    }

    #[test]
    fn default_config_has_no_signing_key() {
        let err = TokenService::new(&JwtConfig::default()).expect_err("no secret");
        assert!(err.to_string().contains("JWT secret is not configured"), "{err}");
    }

    #[test]
    fn weak_config_is_rejected() {
        let short = JwtConfig { secret: "short".to_owned(), ..JwtConfig::default() };
        assert!(matches!(TokenService::new(&short), Err(IdentityError::Config { .. })));

        let no_ttl = JwtConfig { ttl_seconds: 0, ..config() };
        assert!(matches!(TokenService::new(&no_ttl), Err(IdentityError::Config { .. })));
    }

    #[test]
    fn garbage_is_malformed() {
        let service = TokenService::new(&config()).expect("service");
        let err = service.verify("not.a.jwt").expect_err("garbage");
        assert_eq!(err.to_string(), "Invalid token: Token is malformed");
    }
}
