use marquee_core::params::ParamError;

/// Errors surfaced by the catalog pipeline.
///
/// None of these are retried internally; callers decide whether to reload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Missing configuration: {0}")]
    Config(String),
}

pub type CatalogResult<T> = std::result::Result<T, Error>;

impl From<ParamError> for Error {
    fn from(err: ParamError) -> Self {
        Error::Validation(err.to_string())
    }
}
