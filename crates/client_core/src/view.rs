//! Display state owned by the view controller and its plain-text rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use shared::{
    domain::UserId,
    error::ErrorNotice,
    protocol::{RankQueryResult, TopList},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Submitted { user_id: UserId, score: i64 },
    Failed { reason: String },
}

impl SubmitStatus {
    pub fn message(&self) -> &'static str {
        match self {
            SubmitStatus::Submitted { .. } => "Score submitted successfully!",
            SubmitStatus::Failed { .. } => "Failed to submit score.",
        }
    }
}

/// Everything a leaderboard screen shows. Replaced slot by slot by the
/// controller; never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardView {
    pub top: TopList,
    pub rank: Option<RankQueryResult>,
    pub last_error: Option<ErrorNotice>,
    pub submit_status: Option<SubmitStatus>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

pub fn render_top_table(top: &TopList) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:>10}  {:>12}", "Rank", "User ID", "Total Score");
    if top.is_empty() {
        let _ = writeln!(out, "{:>4}  {:>10}  {:>12}", "-", "-", "-");
    }
    for (rank, entry) in top.ranked() {
        let _ = writeln!(
            out,
            "{:>4}  {:>10}  {:>12}",
            rank, entry.user_id.0, entry.total_score
        );
    }
    out
}

pub fn render_rank(result: &RankQueryResult) -> String {
    format!(
        "User ID: {}\nRank: {}\nTotal Score: {}\n",
        result.user_id.0, result.rank, result.total_score
    )
}

pub fn render_view(view: &LeaderboardView) -> String {
    let mut out = String::from("Gaming Leaderboard\n\n");

    if let Some(status) = &view.submit_status {
        let _ = writeln!(out, "{}", status.message());
        if let SubmitStatus::Failed { reason } = status {
            let _ = writeln!(out, "  ({reason})");
        }
        out.push('\n');
    }

    if let Some(rank) = &view.rank {
        out.push_str(&render_rank(rank));
        out.push('\n');
    }
    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "{}\n", error.message);
    }

    out.push_str(&render_top_table(&view.top));
    if let Some(at) = view.last_refreshed_at {
        let _ = writeln!(out, "\nUpdated {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    out
}

#[cfg(test)]
mod tests {
    use shared::{error::ErrorCode, protocol::LeaderboardEntry};

    use super::*;

    fn top(entries: &[(i64, i64)]) -> TopList {
        TopList::from_entries(
            entries
                .iter()
                .map(|(user_id, total_score)| LeaderboardEntry {
                    user_id: UserId(*user_id),
                    total_score: *total_score,
                })
                .collect(),
        )
        .expect("sorted")
    }

    #[test]
    fn table_numbers_rows_by_position() {
        let rendered = render_top_table(&top(&[(1, 300), (2, 300), (3, 100)]));
        let rows: Vec<Vec<&str>> = rendered
            .lines()
            .skip(1)
            .map(|line| line.split_whitespace().collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["1", "1", "300"],
                vec!["2", "2", "300"],
                vec!["3", "3", "100"],
            ]
        );
    }

    #[test]
    fn empty_table_renders_placeholder_row() {
        let rendered = render_top_table(&TopList::default());
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn view_shows_not_found_and_failed_submit() {
        let view = LeaderboardView {
            last_error: Some(ErrorNotice::new(ErrorCode::NotFound, "User not found")),
            submit_status: Some(SubmitStatus::Failed {
                reason: "connection refused".into(),
            }),
            ..LeaderboardView::default()
        };
        let rendered = render_view(&view);
        assert!(rendered.contains("User not found"));
        assert!(rendered.contains("Failed to submit score."));
        assert!(rendered.contains("connection refused"));
        assert!(!rendered.contains("Updated"));
    }

    #[test]
    fn view_shows_rank_card() {
        let view = LeaderboardView {
            rank: Some(RankQueryResult {
                user_id: UserId(12),
                rank: 4,
                total_score: 880,
            }),
            ..LeaderboardView::default()
        };
        let rendered = render_view(&view);
        assert!(rendered.contains("User ID: 12\nRank: 4\nTotal Score: 880"));
    }
}
