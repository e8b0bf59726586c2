/// Remote transformation service boundary
///
/// The workflow only knows the `TransformationService` trait. The concrete
/// Gemini adapter lives in `gemini.rs`; tests plug in fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::state::data::{Costume, ImageData};

pub mod gemini;

pub use gemini::GeminiService;

/// Shown when a failure carries no message of its own
pub const GENERIC_FAILURE: &str = "An unknown error occurred.";

/// Any failure of the remote call (network, content policy, quota, ...)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.user_message())]
pub struct TransformError {
    pub message: Option<String>,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure that did not explain itself
    pub fn unexplained() -> Self {
        Self { message: None }
    }

    /// The message to show the user, verbatim when present
    pub fn user_message(&self) -> String {
        match &self.message {
            Some(message) if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransformError {
    fn from(e: reqwest::Error) -> Self {
        TransformError::new(format!("Network error: {}", e))
    }
}

/// Renders `photo` wearing `costume`
#[async_trait]
pub trait TransformationService: Send + Sync {
    async fn transform(&self, photo: &ImageData, costume: &Costume) -> Result<ImageData, TransformError>;
}

/// Catalog artwork that could not be downloaded
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Thumbnail {url} unavailable: {reason}")]
pub struct ThumbnailError {
    pub url: String,
    pub reason: String,
}

/// Download a catalog thumbnail for display
pub async fn fetch_thumbnail(client: reqwest::Client, url: String) -> Result<Vec<u8>, ThumbnailError> {
    let failed = |e: reqwest::Error| ThumbnailError {
        url: url.clone(),
        reason: e.to_string(),
    };

    let response = client
        .get(&url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(failed)?;
    let bytes = response.bytes().await.map_err(failed)?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_verbatim() {
        let error = TransformError::new("quota exceeded");
        assert_eq!(error.user_message(), "quota exceeded");
        assert_eq!(error.to_string(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_thumbnail_error_names_url() {
        let url = "not a url".to_string();
        let error = fetch_thumbnail(reqwest::Client::new(), url.clone()).await.unwrap_err();
        assert_eq!(error.url, url);
        assert!(error.to_string().starts_with("Thumbnail not a url unavailable"));
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(TransformError::unexplained().to_string(), GENERIC_FAILURE);
        assert_eq!(TransformError::unexplained().user_message(), GENERIC_FAILURE);
        assert_eq!(TransformError::new("   ").user_message(), GENERIC_FAILURE);
    }
}
