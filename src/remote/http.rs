//! HTTP implementation of [`Fetcher`] against a Discourse-style forum.
//!
//! Endpoints:
//! - `GET {base}/u/{id}.json` (profile)
//! - `GET {base}/user_actions.json?offset=0&limit=N&username={id}&filter=1,4,5`
//! - `GET {base}/discourse-reactions/posts/reactions.json?username={id}`
//!
//! The two list endpoints are requested concurrently. Credentials are the
//! caller's business: configure them on the `reqwest::Client` passed to
//! [`HttpFetcher::new`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::fetcher::Fetcher;
use super::payload::{PAGE_LIMIT, decode_actions, decode_profile};
use crate::error::FetchError;
use crate::model::{Action, Profile};

/// Remote fetcher over HTTP.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: String,
    page_limit: usize,
}

impl HttpFetcher {
    /// Creates a fetcher for the forum at `base` (e.g. `https://forum.example`).
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            client,
            base,
            page_limit: PAGE_LIMIT,
        }
    }

    /// Overrides the merged page size (default 10).
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    async fn get_json(&self, req: reqwest::RequestBuilder) -> Result<Value, FetchError> {
        let resp = req.send().await.map_err(|e| FetchError::Transport {
            error: e.to_string(),
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }
        resp.json::<Value>().await.map_err(|e| FetchError::Decode {
            error: e.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn profile(&self, target: &str) -> Result<Profile, FetchError> {
        let url = format!("{}/u/{}.json", self.base, target);
        let body = self.get_json(self.client.get(url)).await?;
        decode_profile(body)
    }

    async fn actions(&self, target: &str) -> Result<Vec<Action>, FetchError> {
        let limit = self.page_limit.to_string();
        let actions_req = self
            .client
            .get(format!("{}/user_actions.json", self.base))
            .query(&[
                ("offset", "0"),
                ("limit", limit.as_str()),
                ("username", target),
                ("filter", "1,4,5"),
            ]);
        let reactions_req = self
            .client
            .get(format!("{}/discourse-reactions/posts/reactions.json", self.base))
            .query(&[("username", target)]);

        let (actions, reactions) =
            tokio::try_join!(self.get_json(actions_req), self.get_json(reactions_req))?;
        let page = decode_actions(actions, reactions, Utc::now(), self.page_limit);
        debug!(user = %target, count = page.len(), "fetched action page");
        Ok(page)
    }
}
