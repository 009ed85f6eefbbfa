use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Notification queue is closed")]
    QueueClosed,
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        AppError::DependencyFailure(err.to_string())
    }
}
