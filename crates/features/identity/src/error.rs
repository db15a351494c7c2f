use modhub_kernel::server::ApiError;
use std::borrow::Cow;

#[modhub_derive::modhub_error]
pub enum IdentityError {
    /// Unusable identity configuration.
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Unknown client or wrong secret.
    #[error("Invalid client credentials{}: {message}", format_context(.context))]
    Credentials { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Missing, malformed, expired or badly signed bearer token.
    #[error("Invalid token{}: {message}", format_context(.context))]
    InvalidToken { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The token lacks a scope the route requires.
    #[error("Insufficient scope{}: {message}", format_context(.context))]
    InsufficientScope { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// None of the requested scopes can be granted to the client.
    #[error("Invalid scope{}: {message}", format_context(.context))]
    InvalidScope { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Token encoding failure.
    #[error("Token signing error{}: {source}", format_context(.context))]
    Signing { source: jsonwebtoken::errors::Error, context: Option<Cow<'static, str>> },
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Credentials { message, .. }
            | IdentityError::InvalidToken { message, .. } => {
                Self::Unauthorized { message, context: None }
            }
            IdentityError::InsufficientScope { message, .. } => {
                Self::Forbidden { message, context: None }
            }
            IdentityError::InvalidScope { message, .. } => {
                Self::BadRequest { message, context: None }
            }
            other @ (IdentityError::Config { .. }
            | IdentityError::Signing { .. }
            | IdentityError::Internal { .. }) => {
                Self::Internal { message: other.to_string().into(), context: None }
            }
        }
    }
}
