//! Errors returned by the backend gateways.

/// Failure of a call to one of the managed services.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// GraphQL `errors` array was present in the response.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// A response parsed but lacked the expected field.
    #[error("missing field in response: {0}")]
    MissingData(&'static str),

    /// Credentials were rejected or the session expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Short machine-friendly code, used in log lines.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Http(_) => "HTTP",
            GatewayError::Status { .. } => "STATUS",
            GatewayError::GraphQl(_) => "GRAPHQL",
            GatewayError::MissingData(_) => "MISSING_DATA",
            GatewayError::Unauthorized(_) => "UNAUTHORIZED",
            GatewayError::Io(_) => "IO",
            GatewayError::Json(_) => "JSON",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_))
            || matches!(self, GatewayError::Status { status: 401, .. })
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
