use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("job board responded with status {0}")]
    Status(u16),

    #[error("invalid search URL: {0}")]
    Url(String),

    #[error("no listings found")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error("identity service is not configured (set JOBPICKER_IDENTITY_API_KEY)")]
    NotConfigured,

    #[error("identity service unreachable: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a PDF file")]
    NotPdf,

    #[error("File not found: {0}")]
    Missing(String),

    #[error("Failed to upload resume: {0}")]
    Simulated(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("local storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every failure a view can surface. None of them end the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Text shown in the dismissible banner or inline form line.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Scrape(ScrapeError::Empty) => {
                "No listings matched this search. Adjust the role or location and try again.".to_string()
            }
            AppError::Scrape(e) => format!("Couldn't load listings ({}). Please try again.", e),
            AppError::Auth(e) => e.to_string(),
            AppError::Upload(e) => e.to_string(),
            AppError::Storage(e) => format!("Couldn't save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_errors_carry_retry_prompt() {
        let err = AppError::from(ScrapeError::Status(503));
        let msg = err.user_message();
        assert!(msg.contains("503"));
        assert!(msg.contains("try again"));
    }

    #[test]
    fn test_empty_result_has_its_own_message() {
        let msg = AppError::from(ScrapeError::Empty).user_message();
        assert!(msg.starts_with("No listings"));
    }

    #[test]
    fn test_auth_and_upload_messages_are_inline_text() {
        let auth = AppError::from(AuthError::Validation("Passwords do not match.".into()));
        assert_eq!(auth.user_message(), "Passwords do not match.");
        assert_eq!(AppError::from(UploadError::NotPdf).user_message(), "Please upload a PDF file");
    }
}
