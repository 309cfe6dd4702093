use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DwrError {
    /// A script buffer was used after it had been exported.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A value could not be converted, or an inbound batch could not be parsed.
    #[error("Marshalling error: {0}")]
    Marshal(String),

    /// A static resource the server expects to ship is missing.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No path pattern matched the request.
    #[error("No handler for path: {0}")]
    RoutingMiss(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DwrError {
    /// Shorthand for a [`DwrError::Marshal`] built from anything printable.
    pub fn marshal(msg: impl Into<String>) -> Self {
        DwrError::Marshal(msg.into())
    }

    /// HTTP status a dispatcher should answer with when this error escapes
    /// request handling.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DwrError::RoutingMiss(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, DwrError>;
