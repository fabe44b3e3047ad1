use std::collections::HashMap;

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use url::Url;

use crate::{
    configuration::ScraperSettings,
    domain::{DataType, ScrapeResult},
    error::ScrapeError,
    services::{compile_selectors, extract, find_next_page, FetchPlan, Fetcher},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Single-selector alias kept for older clients.
    pub selector: Option<String>,
    #[serde(default)]
    pub data_types: Vec<String>,
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub user_agents: Vec<String>,
    pub next_page: Option<String>,
}

impl ScrapeRequest {
    fn all_selectors(&self) -> Vec<String> {
        let mut selectors = self.selectors.clone();
        if let Some(single) = &self.selector {
            selectors.push(single.clone());
        }
        selectors
    }
}

#[post("/scrape")]
async fn scrape(
    body: web::Json<ScrapeRequest>,
    settings: web::Data<ScraperSettings>,
) -> Result<HttpResponse, ScrapeError> {
    let request = body.into_inner();

    let url = Url::parse(&request.url)
        .map_err(|e| ScrapeError::BadRequest(format!("invalid url {:?}: {}", request.url, e)))?;

    let raw_selectors = request.all_selectors();
    if raw_selectors.is_empty() {
        return Err(ScrapeError::BadRequest(
            "at least one selector is required".to_string(),
        ));
    }
    let selectors = compile_selectors(&raw_selectors)?;

    let data_types: Vec<DataType> = request
        .data_types
        .iter()
        .map(|tag| DataType::parse(tag))
        .collect();

    let plan = FetchPlan::build(
        &request.headers,
        &request.cookies,
        &request.proxies,
        &request.user_agents,
    );
    let fetcher = Fetcher::new(settings.fetch_timeout_secs);

    let page = fetcher.fetch(&url, &plan).await?;
    let mut data = extract(&page, &selectors, &data_types);
    log::info!("Extracted {} records from {}", data.len(), page.url);

    let mut next_page = None;
    if let Some(fragment) = request.next_page.as_deref().filter(|f| !f.is_empty()) {
        if let Some(next_url) = find_next_page(&page, fragment) {
            // A failed hop keeps the first page's records.
            match fetcher.fetch(&next_url, &plan).await {
                Ok(next) => {
                    let more = extract(&next, &selectors, &data_types);
                    log::info!("Extracted {} records from next page {}", more.len(), next.url);
                    data.extend(more);
                    next_page = Some(next_url.to_string());
                }
                Err(e) => {
                    log::error!("Failed to follow next page {}: {}", next_url, e);
                }
            }
        }
    }

    Ok(HttpResponse::Ok().json(ScrapeResult { data, next_page }))
}
