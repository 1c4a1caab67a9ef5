//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::http::StatusCode;
use docmerge_core::Error;
use tracing::{error, warn};

/// Standard result type for route handlers returning HTML.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
///
/// Provides convenient methods for returning 404 Not Found when
/// an expected resource (like a session) doesn't exist.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::NOT_FOUND, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}

/// HTTP status for a core error.
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Parse { .. }
        | Error::InvalidPage { .. }
        | Error::InvalidPageRange(_)
        | Error::UnsupportedFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::ConversionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        Error::EmptySelection(_) => StatusCode::NO_CONTENT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a core error into a route error, logging it on the way.
///
/// Server-side failures get a generic message; the cause only goes to the log.
pub fn route_error(err: &Error) -> (StatusCode, String) {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Operation failed: {}", err);
        let message = match err {
            Error::ConversionUnavailable => err.to_string(),
            _ => "Operation failed".to_string(),
        };
        (status, message)
    } else {
        warn!("Rejected request: {}", err);
        (status, err.to_string())
    }
}

/// Extension trait for core results.
pub trait CoreResultExt<T> {
    /// Map a core error to its HTTP status (see [`status_for`]).
    fn or_status(self) -> RouteResult<T>;
}

impl<T> CoreResultExt<T> for docmerge_core::Result<T> {
    fn or_status(self) -> RouteResult<T> {
        self.map_err(|e| route_error(&e))
    }
}

/// Run CPU-bound document work off the async runtime.
///
/// The outer result covers a panicked task; the inner one is the work's own
/// outcome, left for the caller to interpret.
pub async fn spawn_core<F, T>(what: &'static str, work: F) -> RouteResult<docmerge_core::Result<T>>
where
    F: FnOnce() -> docmerge_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!("{} task panicked: {}", what, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{what} failed"),
        )
    })
}
