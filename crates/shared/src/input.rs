//! Parsing of untrusted text input (form fields, CLI arguments) into typed
//! leaderboard values. Nothing here touches the network.

use std::num::IntErrorKind;

use thiserror::Error;

use crate::{domain::UserId, protocol::ScoreSubmission};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Empty { field: &'static str },
    #[error("{field} must be an integer, got '{input}'")]
    NotAnInteger { field: &'static str, input: String },
    #[error("{field} is out of range: '{input}'")]
    OutOfRange { field: &'static str, input: String },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
}

fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    trimmed.parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValidationError::OutOfRange {
            field,
            input: trimmed.to_string(),
        },
        _ => ValidationError::NotAnInteger {
            field,
            input: trimmed.to_string(),
        },
    })
}

pub fn parse_user_id(raw: &str) -> Result<UserId, ValidationError> {
    let value = parse_integer("user_id", raw)?;
    if value < 0 {
        return Err(ValidationError::Negative {
            field: "user_id",
            value,
        });
    }
    Ok(UserId(value))
}

pub fn parse_score(raw: &str) -> Result<i64, ValidationError> {
    parse_integer("score", raw)
}

pub fn parse_submission(user_id: &str, score: &str) -> Result<ScoreSubmission, ValidationError> {
    Ok(ScoreSubmission {
        user_id: parse_user_id(user_id)?,
        score: parse_score(score)?,
    })
}
