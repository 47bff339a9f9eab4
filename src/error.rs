use catalog_client::ClientError;
use thiserror::Error;

/// Errors surfaced by the metadata proxy.
///
/// `NotFound` and `BadRequest` are raised by the proxy itself. Backend
/// failures on mutations arrive untranslated as `Backend`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error("backend: {0}")]
    Backend(#[from] ClientError),
}

impl ProxyError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::NotImplemented(_) => 501,
            Self::Config(_) => 500,
            Self::Backend(_) => 502,
        }
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub(crate) fn bad_request(what: impl std::fmt::Display) -> Self {
        Self::BadRequest(what.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_bad_request() {
        assert_eq!(ProxyError::BadRequest("x".into()).http_status(), 400);
    }

    #[test]
    fn http_status_backend() {
        let e = ProxyError::from(ClientError::Conflict("term exists".into()));
        assert_eq!(e.http_status(), 502);
        assert_eq!(e.to_string(), "backend: conflict: term exists");
    }

    #[test]
    fn http_status_not_implemented() {
        assert_eq!(ProxyError::NotImplemented("x".into()).http_status(), 501);
    }
}
