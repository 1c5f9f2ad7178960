/// Errors produced by the Tower Fault middleware.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FaultError {
    /// The shared error bucket is saturated and the service is backing off.
    ///
    /// The duration is the bucket's advisory wait hint.
    /// When the `axum` feature is enabled, this converts to
    /// `503 Service Unavailable` with a `Retry-After` header.
    #[error("error rate exceeded; retry after {retry_after:?}")]
    Throttled {
        /// The duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    /// An unexpected error occurred in the inner service.
    ///
    /// The string contains the `Display` representation of the inner error.
    /// When the `axum` feature is enabled, this converts to
    /// `500 Internal Server Error`.
    #[error("internal service error: {0}")]
    Inner(String),
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for FaultError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, msg, headers) = match self {
            Self::Throttled { retry_after } => {
                let secs = retry_after.as_secs().max(1);
                let val = axum::http::HeaderValue::from(secs);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    self.to_string(),
                    Some((axum::http::header::RETRY_AFTER, val)),
                )
            }
            Self::Inner(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let mut response = (status, msg).into_response();
        if let Some((name, value)) = headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
