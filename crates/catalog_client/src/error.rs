use thiserror::Error;

/// Errors raised by a catalog backend.
///
/// The proxy never retries on these; they are surfaced as-is (or normalized
/// to not-found for unique-attribute lookups).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::InvalidRequest(_) => 400,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_not_found() {
        assert_eq!(ClientError::NotFound("x".into()).http_status(), 404);
    }

    #[test]
    fn http_status_unavailable() {
        assert_eq!(ClientError::Unavailable("x".into()).http_status(), 503);
    }

    #[test]
    fn display_invalid_request() {
        let e = ClientError::InvalidRequest("term not assigned".into());
        assert_eq!(e.to_string(), "invalid request: term not assigned");
    }

    #[test]
    fn display_internal() {
        let e = ClientError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(e.to_string(), "internal: boom");
    }
}
