// Conversions from HTTP client errors into collaborator error types
use crate::application::completion_service::CompletionError;
use crate::application::monitoring_repository::MonitoringError;

impl From<reqwest::Error> for MonitoringError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MonitoringError::Transport(format!("timed out: {}", e))
        } else {
            MonitoringError::Transport(e.to_string())
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Transport(format!("timed out: {}", e))
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}
