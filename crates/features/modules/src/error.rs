use modhub_kernel::server::ApiError;
use std::borrow::Cow;

#[modhub_derive::modhub_error]
pub enum ModuleError {
    /// No module with this technical name is registered.
    #[error("Module not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The operation is not allowed in the module's current state.
    #[error("Invalid module state{}: {message}", format_context(.context))]
    InvalidState { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The request itself is unusable.
    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// A catalog entry carries a version that is not semantic versioning text.
    #[error("Invalid module version{}: {source}", format_context(.context))]
    Version { source: semver::Error, context: Option<Cow<'static, str>> },
    /// The catalog cannot seed the registry.
    #[error("Invalid module catalog{}: {message}", format_context(.context))]
    Catalog { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Internal module error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ModuleError {
    pub(crate) fn not_found(technical_name: &str) -> Self {
        Self::NotFound {
            message: format!("Module '{technical_name}' is not registered").into(),
            context: None,
        }
    }

    pub(crate) fn not_installed(technical_name: &str) -> Self {
        Self::InvalidState {
            message: format!("Module '{technical_name}' is not installed").into(),
            context: None,
        }
    }
}

impl From<ModuleError> for ApiError {
    fn from(err: ModuleError) -> Self {
        match err {
            ModuleError::NotFound { message, .. } => Self::NotFound { message, context: None },
            ModuleError::InvalidState { message, .. }
            | ModuleError::InvalidInput { message, .. } => {
                Self::BadRequest { message, context: None }
            }
            other @ (ModuleError::Version { .. }
            | ModuleError::Catalog { .. }
            | ModuleError::Internal { .. }) => {
                Self::Internal { message: other.to_string().into(), context: None }
            }
        }
    }
}
