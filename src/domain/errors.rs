use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Imagen inválida: {0}")]
    InvalidImage(String),
    #[error("Fallo de inferencia: {0}")]
    InferenceFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
