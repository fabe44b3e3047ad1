use actix_web::{http::StatusCode, HttpResponse, ResponseError};

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("{0}")]
    BadRequest(String),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

impl ResponseError for ScrapeError {
    fn status_code(&self) -> StatusCode {
        match self {
            ScrapeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ScrapeError::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
