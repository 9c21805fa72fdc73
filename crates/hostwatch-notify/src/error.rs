/// Errors raised while delivering a notification.
///
/// # Examples
///
/// ```rust
/// use hostwatch_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("empty bot token".to_string());
/// assert!(err.to_string().contains("bot token"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Notifier configuration is missing a required value.
    #[error("Notify: invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP request to the delivery endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The delivery API answered with an error.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    ApiError {
        service: String,
        status: u16,
        body: String,
    },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
