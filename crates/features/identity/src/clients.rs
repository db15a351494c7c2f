use crate::error::IdentityError;
use modhub_domain::config::ClientConfig;
use modhub_domain::scopes::ScopeSet;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use std::collections::HashMap;

type SecretDigest = [u8; 32];

#[derive(Clone)]
struct RegisteredClient {
    secret: SecretDigest,
    scopes: ScopeSet,
}

/// API clients allowed to use the client-credentials grant.
///
/// Only SHA-256 digests of the secrets are kept in memory.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, RegisteredClient>,
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").field("clients", &self.clients.keys()).finish()
    }
}

impl ClientRegistry {
    /// # Errors
    /// Returns [`IdentityError::Config`] for empty ids or secrets and for duplicate ids.
    pub fn new(configs: &[ClientConfig]) -> Result<Self, IdentityError> {
        let mut clients = HashMap::with_capacity(configs.len());

        for config in configs {
            if config.client_id.trim().is_empty() || config.client_secret.is_empty() {
                return Err(IdentityError::Config {
                    message: "client_id and client_secret cannot be empty".into(),
                    context: Some("security.identity.clients".into()),
                });
            }
            let client =
                RegisteredClient { secret: digest(&config.client_secret), scopes: config.scopes };
            if clients.insert(config.client_id.clone(), client).is_some() {
                return Err(IdentityError::Config {
                    message: format!("Duplicate client '{}'", config.client_id).into(),
                    context: Some("security.identity.clients".into()),
                });
            }
        }

        Ok(Self { clients })
    }

    /// Checks the credentials and returns the scopes the client may hold.
    ///
    /// # Errors
    /// Returns [`IdentityError::Credentials`] for an unknown client or a wrong secret.
    pub fn authenticate(&self, client_id: &str, secret: &str) -> Result<ScopeSet, IdentityError> {
        let presented = digest(secret);
        // Unknown ids still pay for a comparison so both failures take the same time.
        let (expected, scopes) = self
            .clients
            .get(client_id)
            .map_or(([0_u8; 32], None), |client| (client.secret, Some(client.scopes)));

        match scopes {
            Some(scopes) if bool::from(presented[..].ct_eq(&expected[..])) => Ok(scopes),
            _ => Err(IdentityError::Credentials {
                message: "Unknown client or wrong secret".into(),
                context: None,
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

fn digest(secret: &str) -> SecretDigest {
    let mut out = [0_u8; 32];
    out.copy_from_slice(&Sha256::digest(secret.as_bytes()));
    out
}
