use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("Bad Request: {0}")]
    BadRequestError(String),

    #[error("Not Found: {0}")]
    NotFoundError(String),

    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    #[error("Expired: {0}")]
    ExpiredError(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequestsError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ForbiddenError(..) => StatusCode::FORBIDDEN,
            CustomError::ExpiredError(..) => StatusCode::GONE,
            CustomError::TooManyRequestsError(..) => StatusCode::TOO_MANY_REQUESTS,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = json!({
            "success": false,
            "message": self.to_string(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": match *self {
                CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
                CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
                CustomError::ForbiddenError(..) => "FORBIDDEN_ERROR",
                CustomError::ExpiredError(..) => "EXPIRED_ERROR",
                CustomError::TooManyRequestsError(..) => "TOO_MANY_REQUESTS_ERROR",
                CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
                CustomError::ValidationError(..) => "VALIDATION_ERROR",
            },
            "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            CustomError::BadRequestError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CustomError::NotFoundError("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CustomError::ForbiddenError("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CustomError::ExpiredError("x".into()).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            CustomError::TooManyRequestsError("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            CustomError::InternalServerError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
