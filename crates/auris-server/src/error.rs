//! Maps `auris_core::AurisError` onto HTTP status codes. A newtype is
//! required here because neither `AurisError` nor `IntoResponse` is local
//! to this crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use auris_core::AurisError;

pub struct ApiError(pub AurisError);

impl From<AurisError> for ApiError {
    fn from(err: AurisError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AurisError::SessionAlreadyActive | AurisError::StreamNotRunning => {
                StatusCode::CONFLICT
            }
            AurisError::NotFound(_) => StatusCode::NOT_FOUND,
            AurisError::EmptyTranscript | AurisError::InvalidRecording(_) => {
                StatusCode::BAD_REQUEST
            }
            AurisError::NoAudioCaptured
            | AurisError::EncodeFailed(_)
            | AurisError::TranscribeFailed(_)
            | AurisError::EnhanceFailed(_)
            | AurisError::Audio(_)
            | AurisError::Io(_)
            | AurisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: AurisError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn session_conflicts_map_to_409() {
        assert_eq!(status_for(AurisError::SessionAlreadyActive), StatusCode::CONFLICT);
        assert_eq!(status_for(AurisError::StreamNotRunning), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            status_for(AurisError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn bad_input_maps_to_400() {
        assert_eq!(status_for(AurisError::EmptyTranscript), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(AurisError::InvalidRecording("x".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn backend_failures_map_to_500() {
        assert_eq!(status_for(AurisError::NoAudioCaptured), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_for(AurisError::EncodeFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(AurisError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
