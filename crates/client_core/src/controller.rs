//! Polling view controller: owns the leaderboard view state, refreshes the
//! top list on a timer and applies results of user actions.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::Utc;
use shared::{
    input::{parse_submission, parse_user_id},
    protocol::{RankQueryResult, TopList},
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    view::{LeaderboardView, SubmitStatus},
    LeaderboardApi,
};

/// Monotonic request counter for one state slot.
#[derive(Debug, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
}

impl Sequence {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Only the most recently issued request may write.
    fn is_current(&self, token: u64) -> bool {
        self.issued == token && token > self.applied
    }

    /// Any request newer than the last applied one may write.
    fn try_advance(&mut self, token: u64) -> bool {
        if token <= self.applied {
            return false;
        }
        self.applied = token;
        true
    }

    /// Every token issued so far is spent.
    fn fence(&mut self) {
        self.applied = self.issued;
    }
}

#[derive(Default)]
struct ControllerState {
    view: LeaderboardView,
    top_seq: Sequence,
    rank_seq: Sequence,
    submit_seq: Sequence,
    /// Bumped on teardown only.
    epoch: u64,
}

impl ControllerState {
    /// Outstanding requests from before this point can no longer apply.
    fn invalidate_in_flight(&mut self) {
        self.top_seq.fence();
        self.rank_seq.fence();
        self.submit_seq.fence();
        self.epoch += 1;
    }
}

struct ControllerShared {
    api: Arc<dyn LeaderboardApi>,
    state: Mutex<ControllerState>,
    updates: watch::Sender<LeaderboardView>,
}

impl ControllerShared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `apply` under the state lock and publishes the view if it
    /// reports a change.
    fn update(&self, apply: impl FnOnce(&mut ControllerState) -> bool) -> bool {
        let mut state = self.lock();
        let changed = apply(&mut state);
        if changed {
            self.updates.send_replace(state.view.clone());
        }
        changed
    }

    async fn refresh_top(&self) -> Result<TopList, ClientError> {
        let token = self.lock().top_seq.issue();
        match self.api.fetch_top().await {
            Ok(top) => {
                let applied = self.update(|state| {
                    if !state.top_seq.try_advance(token) {
                        return false;
                    }
                    state.view.top = top.clone();
                    state.view.last_refreshed_at = Some(Utc::now());
                    true
                });
                if applied {
                    debug!(entries = top.len(), token, "leaderboard: top list refreshed");
                } else {
                    debug!(token, "leaderboard: discarded superseded top list response");
                }
                Ok(top)
            }
            Err(err) => {
                warn!(error = %err, "leaderboard: top list refresh failed; keeping last list");
                Err(err)
            }
        }
    }
}

/// Timer ownership. Dropping it cancels the refresh task and fences off
/// every request still in flight.
struct RefreshGuard {
    task: JoinHandle<()>,
    shared: Arc<ControllerShared>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.task.abort();
        self.shared.lock().invalidate_in_flight();
        info!("leaderboard: refresh timer stopped");
    }
}

pub struct LeaderboardController {
    shared: Arc<ControllerShared>,
    refresh_interval: Duration,
    refresh: Option<RefreshGuard>,
}

impl LeaderboardController {
    pub fn new(api: Arc<dyn LeaderboardApi>, refresh_interval: Duration) -> Self {
        let (updates, _) = watch::channel(LeaderboardView::default());
        Self {
            shared: Arc::new(ControllerShared {
                api,
                state: Mutex::new(ControllerState::default()),
                updates,
            }),
            refresh_interval,
            refresh: None,
        }
    }

    /// Fetches the top list now and then every refresh interval until
    /// [`stop`](Self::stop) or drop. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.refresh.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = self.refresh_interval;
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let shared = Arc::clone(&shared);
                // Each tick gets its own task so a slow response never
                // holds back the schedule.
                tokio::spawn(async move {
                    let _ = shared.refresh_top().await;
                });
            }
        });

        info!(
            interval_secs = period.as_secs_f64(),
            "leaderboard: refresh timer started"
        );
        self.refresh = Some(RefreshGuard {
            task,
            shared: Arc::clone(&self.shared),
        });
    }

    pub fn stop(&mut self) {
        self.refresh.take();
    }

    pub fn is_running(&self) -> bool {
        self.refresh.is_some()
    }

    pub fn view(&self) -> LeaderboardView {
        self.shared.lock().view.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LeaderboardView> {
        self.shared.updates.subscribe()
    }

    /// Out-of-cycle refresh; the timer schedule is left alone.
    pub async fn refresh_top(&self) -> Result<TopList, ClientError> {
        self.shared.refresh_top().await
    }

    /// Parses the form input, submits it and, on success, refreshes the top
    /// list once.
    pub async fn submit_score(&self, user_id: &str, score: &str) -> Result<(), ClientError> {
        let (token, epoch) = {
            let mut state = self.shared.lock();
            (state.submit_seq.issue(), state.epoch)
        };

        let result = match parse_submission(user_id, score) {
            Ok(submission) => self
                .shared
                .api
                .submit_score(submission)
                .await
                .map(|()| submission),
            Err(err) => Err(ClientError::from(err)),
        };

        let status = match &result {
            Ok(submission) => SubmitStatus::Submitted {
                user_id: submission.user_id,
                score: submission.score,
            },
            Err(err) => {
                warn!(error = %err, "leaderboard: score submission failed");
                SubmitStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        let mut torn_down = false;
        self.shared.update(|state| {
            torn_down = state.epoch != epoch;
            if !state.submit_seq.is_current(token) {
                return false;
            }
            state.view.submit_status = Some(status);
            true
        });

        result?;
        if torn_down {
            debug!("leaderboard: controller stopped; skipping post-submit refresh");
            return Ok(());
        }
        if let Err(err) = self.refresh_top().await {
            debug!(error = %err, "leaderboard: post-submit refresh failed");
        }
        Ok(())
    }

    /// Looks up one player's rank. Input that does not parse is rejected
    /// before any request and leaves the view untouched.
    pub async fn search_rank(&self, user_id: &str) -> Result<RankQueryResult, ClientError> {
        let user_id = parse_user_id(user_id)?;
        let token = self.shared.lock().rank_seq.issue();
        let result = self.shared.api.fetch_rank(user_id).await;

        self.shared.update(|state| {
            if !state.rank_seq.is_current(token) {
                return false;
            }
            match &result {
                Ok(found) => {
                    state.view.rank = Some(*found);
                    state.view.last_error = None;
                }
                Err(err) => {
                    state.view.rank = None;
                    state.view.last_error = Some(err.rank_notice());
                }
            }
            true
        });

        if let Err(err) = &result {
            info!(user_id = user_id.0, error = %err, "leaderboard: rank lookup failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
