use reqwest::StatusCode;
use shared::{
    domain::UserId,
    error::{ErrorCode, ErrorNotice},
    input::ValidationError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("user {user_id} not found")]
    NotFound { user_id: UserId },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
    #[error("invalid base url '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::NotFound { .. } => ErrorCode::NotFound,
            ClientError::Transport { .. }
            | ClientError::Status { .. }
            | ClientError::InvalidResponse { .. } => ErrorCode::Transport,
            ClientError::InvalidBaseUrl { .. } | ClientError::HttpClient(_) => ErrorCode::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        self.code() == ErrorCode::Transport
    }

    /// What a rank search shows when it fails.
    pub fn rank_notice(&self) -> ErrorNotice {
        match self.code() {
            ErrorCode::NotFound => ErrorNotice::user_not_found(),
            ErrorCode::Validation => ErrorNotice::new(ErrorCode::Validation, self.to_string()),
            code => ErrorNotice::new(code, "Leaderboard service unavailable"),
        }
    }
}
