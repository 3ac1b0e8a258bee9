use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::repo::RepoError;
use crate::views;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("not found")] NotFound,
    #[error("missing or invalid field: {0}")] Validation(String),
    #[error("internal error")] Internal,
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::NotFound,
            RepoError::Internal(msg) => {
                error!("store failure: {msg}");
                ApiError::Internal
            }
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(e: askama::Error) -> Self {
        error!("template failure: {e}");
        ApiError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        error!("session signing failure: {e}");
        ApiError::Internal
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let page = views::ErrorPage { nav: "", status: status.as_u16(), message: self.to_string() };
        match views::render(&page) {
            Ok(html) => HttpResponse::build(status).content_type(views::HTML).body(html),
            Err(_) => HttpResponse::build(status).content_type("text/plain; charset=utf-8").body(self.to_string()),
        }
    }
}
