use crate::error::FetchError;
use crate::http::Transport;
use serde::Deserialize;

/// Characters of the explanation shown before truncation.
pub const EXPLANATION_PREVIEW_CHARS: usize = 200;

/// Astronomy Picture of the Day metadata. Every field is optional in practice.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Apod {
    pub title: Option<String>,
    pub date: Option<String>,
    pub explanation: Option<String>,
    pub url: Option<String>,
    pub hdurl: Option<String>,
    pub media_type: Option<String>,
}

impl Apod {
    pub fn fetch(transport: &dyn Transport, endpoint: &str, api_key: &str) -> Result<Self, FetchError> {
        let body = transport.get(endpoint, &[("api_key", api_key)])?.into_success()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// High-definition URL when present, else the standard one.
    pub fn image_url(&self) -> Option<&str> {
        non_empty(&self.hdurl).or_else(|| non_empty(&self.url))
    }

    /// Videos and other media are listed but not downloaded.
    pub fn is_image(&self) -> bool {
        self.media_type.as_deref().is_none_or(|m| m == "image")
    }

    pub fn title_or_na(&self) -> String {
        self.title.clone().unwrap_or_else(|| "N/A".into())
    }

    pub fn date_or_na(&self) -> String {
        self.date.clone().unwrap_or_else(|| "N/A".into())
    }

    pub fn explanation_preview(&self) -> String {
        let text = self.explanation.as_deref().unwrap_or("N/A");
        let preview: String = text.chars().take(EXPLANATION_PREVIEW_CHARS).collect();
        format!("{}...", preview)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
