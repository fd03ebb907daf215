use async_trait::async_trait;
use shared::{
    domain::UserId,
    protocol::{RankQueryResult, ScoreSubmission, TopList},
};

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod view;

pub use config::{load_settings, ClientSettings, REFRESH_INTERVAL};
pub use controller::LeaderboardController;
pub use error::ClientError;
pub use http::HttpLeaderboardClient;
pub use view::{LeaderboardView, SubmitStatus};

/// The three calls the leaderboard service answers. Implementations make at
/// most one attempt per call.
#[async_trait]
pub trait LeaderboardApi: Send + Sync {
    /// Forwards the pair as-is; how it combines with earlier scores is up to
    /// the service.
    async fn submit_score(&self, submission: ScoreSubmission) -> Result<(), ClientError>;
    async fn fetch_top(&self) -> Result<TopList, ClientError>;
    async fn fetch_rank(&self, user_id: UserId) -> Result<RankQueryResult, ClientError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
