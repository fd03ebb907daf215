use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{UserId, TOP_LIST_LIMIT};

pub const SUBMIT_PATH: &str = "api/leaderboard/submit";
pub const TOP_PATH: &str = "api/leaderboard/top";
pub const RANK_PATH_PREFIX: &str = "api/leaderboard/rank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub user_id: UserId,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub total_score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankQueryResult {
    pub user_id: UserId,
    pub rank: u64,
    pub total_score: i64,
}

/// Rank payload as sent by the service. Unknown users come back as a 2xx
/// with `rank: -1` (or no rank at all), so this is only a
/// [`RankQueryResult`] once the rank is known to be positive.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RankResponse {
    pub user_id: UserId,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub total_score: i64,
}

impl RankResponse {
    pub fn into_result(self) -> Option<RankQueryResult> {
        let rank = self.rank.filter(|rank| *rank >= 1)?;
        Some(RankQueryResult {
            user_id: self.user_id,
            rank: rank as u64,
            total_score: self.total_score,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopListError {
    #[error("top list holds {actual} entries, limit is {limit}")]
    TooLong { limit: usize, actual: usize },
    #[error("top list out of order at position {position}: {current} follows {previous}")]
    OutOfOrder {
        position: usize,
        previous: i64,
        current: i64,
    },
    #[error("user {user_id} appears more than once in the top list")]
    DuplicateUser { user_id: UserId },
}

/// Snapshot of the highest scoring players, highest first. Rank is the
/// 1-based position; ties keep the order the service sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopList {
    entries: Vec<LeaderboardEntry>,
}

impl TopList {
    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Result<Self, TopListError> {
        if entries.len() > TOP_LIST_LIMIT {
            return Err(TopListError::TooLong {
                limit: TOP_LIST_LIMIT,
                actual: entries.len(),
            });
        }

        for (index, pair) in entries.windows(2).enumerate() {
            if pair[0].total_score < pair[1].total_score {
                return Err(TopListError::OutOfOrder {
                    position: index + 2,
                    previous: pair[0].total_score,
                    current: pair[1].total_score,
                });
            }
        }

        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|entry| !seen.insert(entry.user_id)) {
            return Err(TopListError::DuplicateUser {
                user_id: dup.user_id,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ranked(&self) -> impl Iterator<Item = (usize, &LeaderboardEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index + 1, entry))
    }

    pub fn rank_of(&self, user_id: UserId) -> Option<usize> {
        self.ranked()
            .find(|(_, entry)| entry.user_id == user_id)
            .map(|(rank, _)| rank)
    }
}
