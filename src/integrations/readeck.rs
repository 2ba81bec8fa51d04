use crate::config::ReadeckConfig;
use crate::error::SyncError;
use crate::models::{Annotation, BookmarkRef};
use reqwest::Url;
use reqwest::blocking::Client;
use std::time::Duration;

const MIN_TIMEOUT_SECONDS: u64 = 5;

/// Where bookmarks and their annotations come from.
pub trait BookmarkSource: Send + Sync {
    fn fetch_bookmarks(&self) -> Result<Vec<BookmarkRef>, SyncError>;
    fn fetch_annotations(&self, bookmark_id: &str) -> Result<Vec<Annotation>, SyncError>;
}

pub struct ReadeckClient {
    client: Client,
    api_url: Url,
    api_token: String,
}

impl ReadeckClient {
    pub fn new(config: &ReadeckConfig) -> Result<Self, SyncError> {
        let raw_url = config.api_url.trim();
        if raw_url.is_empty() {
            return Err(SyncError::Config("Missing Readeck API URL.".to_string()));
        }
        let api_url = Url::parse(raw_url)
            .map_err(|e| SyncError::Config(format!("Invalid Readeck API URL {raw_url:?}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "Invalid Readeck API URL {raw_url:?}: not a base URL"
            )));
        }

        let api_token = config.resolve_api_token();
        if api_token.is_empty() {
            return Err(SyncError::Config("Missing Readeck API token.".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.timeout_seconds.max(MIN_TIMEOUT_SECONDS),
            ))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url,
            api_token,
        })
    }

    /// Appends `segments` to the base URL path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("Readeck API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str], what: &str) -> Result<String, SyncError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        if !resp.status().is_success() {
            return Err(SyncError::Request(format!(
                "{what} failed: HTTP {}",
                resp.status()
            )));
        }
        Ok(resp.text()?)
    }
}

impl BookmarkSource for ReadeckClient {
    fn fetch_bookmarks(&self) -> Result<Vec<BookmarkRef>, SyncError> {
        let body = self.get(&["api", "bookmarks"], "Bookmark list")?;
        decode_bookmarks(&body)
    }

    fn fetch_annotations(&self, bookmark_id: &str) -> Result<Vec<Annotation>, SyncError> {
        let body = self.get(
            &["api", "bookmarks", bookmark_id, "annotations"],
            "Annotation list",
        )?;
        decode_annotations(&body)
    }
}

/// Decodes the bookmark list. Records without a string `id` and `title` are
/// dropped with a warning, the rest of the list is kept.
pub fn decode_bookmarks(body: &str) -> Result<Vec<BookmarkRef>, SyncError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| SyncError::Request(format!("Invalid bookmark list: {e}")))?;

    let mut bookmarks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<BookmarkRef>(record) {
            Ok(bookmark) => bookmarks.push(bookmark),
            Err(err) => tracing::warn!(index, error = %err, "skipping malformed bookmark record"),
        }
    }
    Ok(bookmarks)
}

/// Decodes a bookmark's annotations. Any malformed record fails the whole list.
pub fn decode_annotations(body: &str) -> Result<Vec<Annotation>, SyncError> {
    serde_json::from_str(body)
        .map_err(|e| SyncError::Request(format!("Invalid annotation list: {e}")))
}
