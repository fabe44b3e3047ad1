use std::collections::HashMap;
use std::time::Duration;

use fake_user_agent::get_rua;
use rand::seq::SliceRandom;
use url::Url;

use crate::error::ScrapeError;

/// Everything decided about the outgoing request before the visit starts:
/// all header pairs, plus one cookie string, one proxy and one user agent
/// picked uniformly at random from the offered lists.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub headers: Vec<(String, String)>,
    pub cookie_header: Option<String>,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl FetchPlan {
    pub fn build(
        headers: &HashMap<String, String>,
        cookies: &[String],
        proxies: &[String],
        user_agents: &[String],
    ) -> FetchPlan {
        let mut rng = rand::thread_rng();

        let cookie_header = cookies.choose(&mut rng).and_then(|raw| {
            let pairs = parse_cookie_pairs(raw);
            match pairs.is_empty() {
                true => None,
                false => Some(
                    pairs
                        .iter()
                        .map(|(name, value)| format!("{}={}", name, value))
                        .collect::<Vec<String>>()
                        .join("; "),
                ),
            }
        });

        FetchPlan {
            headers: headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            cookie_header,
            proxy: proxies.choose(&mut rng).cloned(),
            user_agent: user_agents
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| get_rua().to_string()),
        }
    }
}

/// Semicolon-delimited `name=value` pairs; malformed pieces are dropped.
pub fn parse_cookie_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|piece| piece.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// One page retrieved over the network. `url` is the final URL after
/// redirects and is the base for resolving relative hrefs.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

pub struct Fetcher {
    timeout: Duration,
}

impl Fetcher {
    pub fn new(timeout_secs: u64) -> Self {
        Fetcher {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// One GET against `url` with the plan applied. No retries; a transport
    /// failure or non-success status is terminal for this visit.
    pub async fn fetch(&self, url: &Url, plan: &FetchPlan) -> Result<FetchedPage, ScrapeError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(plan.user_agent.as_str());

        if let Some(proxy) = &plan.proxy {
            let http_proxy = reqwest::Proxy::http(proxy.as_str()).map_err(|e| {
                ScrapeError::BadRequest(format!("invalid proxy url {:?}: {}", proxy, e))
            })?;
            let https_proxy = reqwest::Proxy::https(proxy.as_str()).map_err(|e| {
                ScrapeError::BadRequest(format!("invalid proxy url {:?}: {}", proxy, e))
            })?;
            builder = builder.proxy(http_proxy).proxy(https_proxy);
        }

        let client = builder.build().map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = client.get(url.clone());
        for (name, value) in &plan.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = &plan.cookie_header {
            request = request.header("Cookie", cookie.as_str());
        }

        let response = request
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| ScrapeError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}
