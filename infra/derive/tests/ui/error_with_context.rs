use modhub_derive::modhub_error;
use std::borrow::Cow;

#[modhub_error]
pub enum CatalogError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown module{}: {message}", format_context(.context))]
    Unknown { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn load(path: &str) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).context("Reading catalog")
}

fn unknown() -> Result<(), CatalogError> {
    Err(CatalogError::Unknown { message: "ps_missing".into(), context: None })
        .context("Resolving module")
}

fn main() {
    let err = load("/definitely/not/here").unwrap_err();
    assert!(err.to_string().starts_with("IO error (Reading catalog)"));

    let err = unknown().unwrap_err();
    assert_eq!(err.to_string(), "Unknown module (Resolving module): ps_missing");

    let err: CatalogError = "boom".into();
    assert!(matches!(err, CatalogError::Internal { .. }));
}
