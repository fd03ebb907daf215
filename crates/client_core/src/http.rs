use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{UserId, TOP_LIST_LIMIT},
    protocol::{
        LeaderboardEntry, RankQueryResult, RankResponse, ScoreSubmission, TopList, RANK_PATH_PREFIX,
        SUBMIT_PATH, TOP_PATH,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::ClientSettings, error::ClientError, LeaderboardApi};

/// [`LeaderboardApi`] over the service's REST endpoints. One request per
/// call, no retries.
#[derive(Clone)]
pub struct HttpLeaderboardClient {
    http: Client,
    base_url: Url,
}

impl HttpLeaderboardClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(ClientError::HttpClient)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: err.to_string(),
            })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, status = response.status().as_u16(), "leaderboard: request completed");
        Ok(response)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        base_url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http:// or https:// address".into()));
    }
    // Endpoint paths are joined relative to the base, so a path prefix such
    // as `/games/arcade` has to end in a slash to survive the join.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn ensure_success(response: &Response, url: &Url) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            url: url.to_string(),
            status,
        })
    }
}

fn malformed(url: &Url, reason: impl ToString) -> ClientError {
    ClientError::InvalidResponse {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl LeaderboardApi for HttpLeaderboardClient {
    async fn submit_score(&self, submission: ScoreSubmission) -> Result<(), ClientError> {
        let url = self.endpoint(SUBMIT_PATH)?;
        debug!(
            %url,
            user_id = submission.user_id.0,
            score = submission.score,
            "leaderboard: submitting score"
        );
        let response = self
            .send(self.http.post(url.clone()).json(&submission), &url)
            .await?;
        ensure_success(&response, &url)?;
        info!(
            user_id = submission.user_id.0,
            score = submission.score,
            "leaderboard: score submitted"
        );
        Ok(())
    }

    async fn fetch_top(&self) -> Result<TopList, ClientError> {
        let url = self.endpoint(TOP_PATH)?;
        debug!(%url, "leaderboard: fetching top list");
        let response = self.send(self.http.get(url.clone()), &url).await?;
        ensure_success(&response, &url)?;

        let mut entries: Vec<LeaderboardEntry> =
            response.json().await.map_err(|err| malformed(&url, err))?;
        if entries.len() > TOP_LIST_LIMIT {
            warn!(
                %url,
                received = entries.len(),
                limit = TOP_LIST_LIMIT,
                "leaderboard: top list longer than the display limit; keeping the head"
            );
            entries.truncate(TOP_LIST_LIMIT);
        }
        TopList::from_entries(entries).map_err(|err| malformed(&url, err))
    }

    async fn fetch_rank(&self, user_id: UserId) -> Result<RankQueryResult, ClientError> {
        let url = self.endpoint(&format!("{RANK_PATH_PREFIX}/{user_id}"))?;
        debug!(%url, user_id = user_id.0, "leaderboard: fetching rank");
        let response = self.send(self.http.get(url.clone()), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound { user_id });
        }
        ensure_success(&response, &url)?;

        let payload: RankResponse = response.json().await.map_err(|err| malformed(&url, err))?;
        if payload.user_id != user_id {
            return Err(malformed(
                &url,
                format!(
                    "asked for user {user_id}, service answered for user {}",
                    payload.user_id
                ),
            ));
        }
        payload
            .into_result()
            .ok_or(ClientError::NotFound { user_id })
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
