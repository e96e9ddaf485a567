//! Backend analytics API integration (purchase timeline endpoint).

use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::data::{FetchedTimeline, TimelineSource};
use crate::error::AppError;
use crate::io::ingest::parse_timeline_json;

const TIMELINE_PATH: &str = "/api/analytics/purchase-timeline";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const ENV_API_URL: &str = "PTL_API_URL";
const ENV_TIMEOUT: &str = "PTL_HTTP_TIMEOUT_SECS";

pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(ENV_API_URL)
            .map_err(|_| AppError::usage(format!("Missing {ENV_API_URL} in environment (.env).")))?;
        let timeout = parse_timeout(std::env::var(ENV_TIMEOUT).ok().as_deref())?;
        Self::new(base_url, timeout)
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::usage(
                format!("{ENV_API_URL} must be an http(s) URL, got '{base_url}'."),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn timeline_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), TIMELINE_PATH)
    }

    /// Fetch the full timeline snapshot (the endpoint takes no parameters).
    pub fn fetch_timeline(&self) -> Result<FetchedTimeline, AppError> {
        let url = self.timeline_url();
        debug!(%url, "fetching purchase timeline");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::runtime(format!("Timeline request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::runtime(
                format!("Timeline request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::runtime(format!("Failed to read timeline response: {e}")))?;
        let ingest = parse_timeline_json(&body)?;

        info!(
            products = ingest.products.len(),
            dropped = ingest.dropped.len(),
            "timeline fetched"
        );

        Ok(FetchedTimeline {
            source: format!("api {}", self.base_url),
            fetched_at: Utc::now(),
            ingest,
        })
    }
}

impl TimelineSource for AnalyticsClient {
    fn label(&self) -> String {
        format!("api {}", self.base_url)
    }

    fn fetch(&self) -> Result<FetchedTimeline, AppError> {
        self.fetch_timeline()
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<Duration, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    let secs: u64 = raw
        .parse()
        .map_err(|_| AppError::usage(format!("{ENV_TIMEOUT} must be a whole number of seconds, got '{raw}'.")))?;
    if secs == 0 {
        return Err(AppError::usage(format!("{ENV_TIMEOUT} must be > 0.")));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_url_joins_without_double_slash() {
        let client = AnalyticsClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.timeline_url(),
            "http://localhost:8000/api/analytics/purchase-timeline"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = AnalyticsClient::new("localhost:8000", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn timeout_defaults_and_validates() {
        assert_eq!(parse_timeout(None).unwrap(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(parse_timeout(Some(" 3 ")).unwrap(), Duration::from_secs(3));
        assert!(parse_timeout(Some("0")).is_err());
        assert!(parse_timeout(Some("soon")).is_err());
    }
}
