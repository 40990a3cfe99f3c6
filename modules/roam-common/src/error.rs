use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
