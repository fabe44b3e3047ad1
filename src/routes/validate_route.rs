use std::collections::HashMap;

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use url::Url;

use crate::{
    configuration::ScraperSettings,
    domain::ValidationResult,
    error::ScrapeError,
    services::{compile_selector, matched_tag_names, FetchPlan, Fetcher},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub selector: String,
}

/// Fetch failures are reported in the body as `success: false`, never as
/// an HTTP error.
#[post("/validateSelector")]
async fn validate_selector(
    body: web::Json<ValidateRequest>,
    settings: web::Data<ScraperSettings>,
) -> Result<HttpResponse, ScrapeError> {
    let request = body.into_inner();

    let url = Url::parse(&request.url)
        .map_err(|e| ScrapeError::BadRequest(format!("invalid url {:?}: {}", request.url, e)))?;
    let selector = compile_selector(&request.selector)?;

    let plan = FetchPlan::build(&request.headers, &[], &[], &[]);
    let fetcher = Fetcher::new(settings.fetch_timeout_secs);

    let result = match fetcher.fetch(&url, &plan).await {
        Ok(page) => {
            let data_types = matched_tag_names(&page, &selector);
            ValidationResult {
                success: !data_types.is_empty(),
                data_types,
                error: None,
            }
        }
        Err(e) => {
            log::error!("Validation fetch failed: {}", e);
            ValidationResult {
                success: false,
                data_types: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    };

    Ok(HttpResponse::Ok().json(result))
}
