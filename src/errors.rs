use axum::http::StatusCode;
use thiserror::Error;

/// Failure outcome of a single garden or auth operation.
#[derive(Debug, Error)]
pub enum HabitError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("no habit in slot {slot}")]
    NotFound { slot: usize },
    /// The backend answered but refused or garbled the request. `message` is
    /// the server's text when it sent one.
    #[error("{message}")]
    Backend { status: u16, message: String },
    /// No response arrived.
    #[error("could not reach backend: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("session expired, please log in again")]
    SessionExpired,
}

impl HabitError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "not logged in".into(),
        }
    }
}

impl From<HabitError> for AppError {
    fn from(err: HabitError) -> Self {
        let status = match &err {
            HabitError::Validation(_) => StatusCode::BAD_REQUEST,
            HabitError::NotFound { .. } => StatusCode::NOT_FOUND,
            // A garbled 2xx body must not look like success to the browser.
            HabitError::Backend { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            HabitError::Fetch(_) => StatusCode::BAD_GATEWAY,
            HabitError::SessionExpired => StatusCode::UNAUTHORIZED,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
