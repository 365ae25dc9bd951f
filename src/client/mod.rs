//! Outbound HTTP with busy-indicator interception.
//!
//! Every call made through [`RecipeClient`] is bracketed by the coordinator's
//! `begin()`/`end()` unless it opts out with [`Tracking::Silent`]. The pending
//! guard lives until the response body has been read or the call has failed, so
//! the count stays balanced on every exit path.

mod error;

pub use error::ClientError;

use crate::indicator::{PendingGuard, VisibilityCoordinator};
use reqwest::{Request, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Whether a request drives the busy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracking {
    /// Counted by the coordinator
    #[default]
    Indicator,
    /// Bypasses the coordinator entirely (background polling, keep-alives)
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("busy-indicator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for the blend-recipe API.
#[derive(Debug, Clone)]
pub struct RecipeClient {
    http: reqwest::Client,
    base_url: Url,
    indicator: VisibilityCoordinator,
}

impl RecipeClient {
    pub fn new(cfg: &ClientConfig, indicator: VisibilityCoordinator) -> Result<Self, ClientError> {
        let base_url = Url::parse(&cfg.base_url).map_err(|e| ClientError::InvalidUrl {
            url: cfg.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            indicator,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn indicator(&self) -> &VisibilityCoordinator {
        &self.indicator
    }

    /// Underlying client, for building requests passed to [`execute`](Self::execute).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve `path` against the configured base URL.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url.join(path).map_err(|e| ClientError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Send a prepared request. Non-2xx statuses are returned as errors.
    pub async fn execute(&self, request: Request, tracking: Tracking) -> Result<Response, ClientError> {
        let _pending = self.intercept(tracking);
        debug!(url = %request.url(), ?tracking, "dispatching request");
        let response = self.http.execute(request).await?;
        check_status(response)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, tracking: Tracking) -> Result<T, ClientError> {
        let url = self.url(path)?;
        let _pending = self.intercept(tracking);
        debug!(%url, ?tracking, "GET");
        let response = self.http.get(url).send().await?;
        let response = check_status(response)?;
        Ok(response.json::<T>().await?)
    }

    fn intercept(&self, tracking: Tracking) -> Option<PendingGuard> {
        match tracking {
            Tracking::Indicator => Some(self.indicator.track()),
            Tracking::Silent => None,
        }
    }
}

fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
