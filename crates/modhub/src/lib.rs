//! Facade crate for `ModuleHub` feature slices and shared modules.
//! Re-exports domain/kernel primitives and aggregates slice initialization.
//!
//! ## Usage
//! - Add `modhub` with the `server` feature.
//! - Call [`init`] to build every feature slice, then register them on the API state.

pub use modhub_domain as domain;
pub use modhub_kernel as kernel;

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        pub use modhub_kernel::server::router::system_router;
    }
}

/// Feature slices compiled into this build.
#[cfg(feature = "server")]
pub mod features {
    pub use modhub_identity as identity;
    pub use modhub_modules as modules;
}

/// Initializes every feature slice.
///
/// # Errors
/// Returns the first slice initialization failure.
#[cfg(feature = "server")]
pub fn init(
    config: &domain::config::ApiConfig,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    // Identity first: the modules routes are guarded by its token verifier.
    let slices = vec![features::identity::init(config)?, features::modules::init(config)?];

    Ok(slices)
}

#[cfg(all(test, feature = "server"))]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_refused_without_signing_key() {
        let config = domain::config::ApiConfig::default();
        assert!(init(&config).is_err());
    }

    #[test]
    fn configured_secret_initializes_every_slice() {
        let mut config = domain::config::ApiConfig::default();
        config.security.identity.jwt.secret = "facade-test-secret-0123456789".to_owned();

        let slices = init(&config).expect("slices");
        assert_eq!(slices.len(), 2);
    }
}
