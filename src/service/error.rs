use axum::http::StatusCode;
use thiserror::Error;

use crate::{db::error::StoreError, error::HttpError, models::questmodel::QuestAction};

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    /// Store or external platform failure. Safe to retry: no partial state is left behind.
    UpstreamUnavailable,
    /// The quest predicate is correctly false. Not a fault, retrying will not help.
    NotCompleted,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Cannot use your own referral code")]
    SelfReferralNotAllowed,

    #[error("Invalid target value '{target}' on quest {quest_id}")]
    MalformedQuestTarget { quest_id: i64, target: String },

    #[error("No quest checker registered for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("Platform '{platform}' has no checker for action {action}")]
    UnsupportedAction { platform: String, action: QuestAction },

    #[error("Quest {0} has expired")]
    QuestExpired(i64),

    #[error("Quest {0} is an invite tier and completes through referrals")]
    InviteQuestNotDirectlyCompletable(i64),

    #[error("Referee with ID {0} has already used a referral code")]
    ReferralAlreadyUsed(String),

    #[error("User {user_id} has already completed quest {quest_id}")]
    QuestAlreadyCompleted { user_id: String, quest_id: i64 },

    #[error("User {0} already exists")]
    UserAlreadyExists(String),

    #[error("Quest {0} not found")]
    QuestNotFound(i64),

    #[error("Referral code {0} not found")]
    UnknownReferralCode(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Quest {quest_id} not completed by user {user_id}")]
    QuestNotCompleted { user_id: String, quest_id: i64 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Quest checker unavailable: {0}")]
    CheckerUnavailable(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::SelfReferralNotAllowed
            | ServiceError::MalformedQuestTarget { .. }
            | ServiceError::UnsupportedPlatform(_)
            | ServiceError::UnsupportedAction { .. }
            | ServiceError::QuestExpired(_)
            | ServiceError::InviteQuestNotDirectlyCompletable(_) => ErrorKind::Validation,

            ServiceError::ReferralAlreadyUsed(_)
            | ServiceError::QuestAlreadyCompleted { .. }
            | ServiceError::UserAlreadyExists(_) => ErrorKind::Conflict,

            ServiceError::QuestNotFound(_)
            | ServiceError::UnknownReferralCode(_)
            | ServiceError::UserNotFound(_) => ErrorKind::NotFound,

            ServiceError::StoreUnavailable(_) | ServiceError::CheckerUnavailable(_) => {
                ErrorKind::UpstreamUnavailable
            }

            ServiceError::QuestNotCompleted { .. } => ErrorKind::NotCompleted,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotCompleted => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error.kind() {
            ErrorKind::Validation => HttpError::bad_request(error.to_string()),
            ErrorKind::Conflict => HttpError::conflict(error.to_string()),
            ErrorKind::NotFound => HttpError::not_found(error.to_string()),
            // Store internals stay out of the response body.
            ErrorKind::UpstreamUnavailable => HttpError::new(
                "Service temporarily unavailable, please retry",
                error.status_code(),
            ),
            ErrorKind::NotCompleted => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}
