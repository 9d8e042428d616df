//! Movie database API client
//!
//! Reads discover pages and movie videos through the backend's pass-through
//! proxy (`{api_url}/tmdb/...`) and classifies failures for the retry policy:
//! HTTP 429 is `RateLimited`, everything else that goes wrong is a generic
//! retryable failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{null_as_default, Locale};
use crate::error::FetchError;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("moviecat/", env!("CARGO_PKG_VERSION"));

/// One page of `discover/movie` results.
///
/// `results` is optional so a response without it can be told apart from a
/// malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub results: Option<Vec<RemoteMovie>>,
}

/// A movie as returned by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMovie {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A video attached to a movie (trailers, teasers, clips)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.kind == "Trailer" && self.site == "YouTube"
    }

    /// Watch URL for YouTube videos
    pub fn url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    results: Vec<Video>,
}

/// Read-only access to the remote movie catalog
///
/// Each call is a single attempt; retrying is the caller's concern.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetches the first discover page for `genre` in `locale`
    async fn discover(&self, genre: u32, locale: Locale) -> Result<DiscoverPage, FetchError>;

    /// Fetches the videos attached to a movie
    async fn videos(&self, movie_id: u64, locale: Locale) -> Result<Vec<Video>, FetchError>;
}

/// HTTP client for the movie API proxy
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    /// Backend API root, e.g. `http://localhost:5000/api`
    base_url: String,
}

impl TmdbClient {
    /// Creates a client over a shared HTTP client.
    ///
    /// Timeouts and default headers come from `client`.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn proxy_url(&self, path: &str) -> String {
        format!("{}/tmdb/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        debug!(url, "Requesting movie API");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        classify_status(response.status())?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Maps an HTTP status onto the retry taxonomy
fn classify_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(FetchError::RateLimited)
    } else if !status.is_success() {
        Err(FetchError::Status(status.as_u16()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn discover(&self, genre: u32, locale: Locale) -> Result<DiscoverPage, FetchError> {
        let url = self.proxy_url("discover/movie");
        self.get_json(
            &url,
            &[
                ("with_genres", genre.to_string()),
                ("language", locale.api_tag()),
            ],
        )
        .await
    }

    async fn videos(&self, movie_id: u64, locale: Locale) -> Result<Vec<Video>, FetchError> {
        let url = self.proxy_url(&format!("movie/{}/videos", movie_id));
        let response: VideosResponse = self
            .get_json(&url, &[("language", locale.api_tag())])
            .await?;
        Ok(response.results)
    }
}

/// Picks the first YouTube trailer from a list of videos
pub fn find_trailer(videos: &[Video]) -> Option<&Video> {
    videos.iter().find(|video| video.is_youtube_trailer())
}
