//! Persisted movie store
//!
//! The backend keeps a single, unpartitioned `movies` table that the catalog
//! replaces wholesale after every successful remote fetch and reads back as a
//! fallback when the remote API is unavailable.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::MovieRecord;
use crate::error::StoreError;

/// Access to the persisted movie collection
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Returns every stored movie
    async fn all(&self) -> Result<Vec<MovieRecord>, StoreError>;

    /// Returns the movie with the given external id, if stored
    async fn get(&self, tmdb_id: u64) -> Result<Option<MovieRecord>, StoreError>;

    /// Inserts a movie and returns the stored row
    async fn insert(&self, record: &MovieRecord) -> Result<MovieRecord, StoreError>;

    /// Removes every stored movie
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Updates the movie with the given external id.
    ///
    /// Returns `None` when no row matched.
    async fn update(
        &self,
        tmdb_id: u64,
        record: &MovieRecord,
    ) -> Result<Option<MovieRecord>, StoreError>;

    /// Replaces the whole collection: delete everything, then insert each record.
    ///
    /// Not atomic. A concurrent reader can observe a partial collection.
    async fn replace_all(&self, records: &[MovieRecord]) -> Result<(), StoreError> {
        self.delete_all().await?;
        for record in records {
            self.insert(record).await?;
        }
        Ok(())
    }
}

/// Movie store served by the backend REST API at `{api_url}/movies`
#[derive(Debug, Clone)]
pub struct BackendStore {
    client: Client,
    base_url: String,
}

impl BackendStore {
    /// Creates a store client sharing an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn movies_url(&self) -> String {
        format!("{}/movies", self.base_url)
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        format!("{}/movies/{}", self.base_url, tmdb_id)
    }

    /// Turns non-2xx responses into `StoreError::Status`
    async fn check_response(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

#[async_trait]
impl MovieStore for BackendStore {
    async fn all(&self) -> Result<Vec<MovieRecord>, StoreError> {
        let response = self.client.get(self.movies_url()).send().await?;
        let text = Self::check_response(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, tmdb_id: u64) -> Result<Option<MovieRecord>, StoreError> {
        let response = self.client.get(self.movie_url(tmdb_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = Self::check_response(response).await?.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn insert(&self, record: &MovieRecord) -> Result<MovieRecord, StoreError> {
        let response = self
            .client
            .post(self.movies_url())
            .json(record)
            .send()
            .await?;
        let text = Self::check_response(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let response = self.client.delete(self.movies_url()).send().await?;
        Self::check_response(response).await?;
        debug!("Deleted all stored movies");
        Ok(())
    }

    async fn update(
        &self,
        tmdb_id: u64,
        record: &MovieRecord,
    ) -> Result<Option<MovieRecord>, StoreError> {
        let response = self
            .client
            .put(self.movie_url(tmdb_id))
            .json(record)
            .send()
            .await?;
        let text = Self::check_response(response).await?.text().await?;
        // The backend answers 200 with an empty body when nothing matched
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// In-process movie store
#[derive(Debug, Default)]
pub struct MemoryMovieStore {
    rows: Mutex<Vec<MovieRecord>>,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`
    pub fn with_records(records: Vec<MovieRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<MovieRecord>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn all(&self) -> Result<Vec<MovieRecord>, StoreError> {
        Ok(self.rows().clone())
    }

    async fn get(&self, tmdb_id: u64) -> Result<Option<MovieRecord>, StoreError> {
        Ok(self.rows().iter().find(|row| row.tmdb_id == tmdb_id).cloned())
    }

    async fn insert(&self, record: &MovieRecord) -> Result<MovieRecord, StoreError> {
        self.rows().push(record.clone());
        Ok(record.clone())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.rows().clear();
        Ok(())
    }

    async fn update(
        &self,
        tmdb_id: u64,
        record: &MovieRecord,
    ) -> Result<Option<MovieRecord>, StoreError> {
        let mut rows = self.rows();
        let Some(row) = rows.iter_mut().find(|row| row.tmdb_id == tmdb_id) else {
            return Ok(None);
        };
        *row = MovieRecord {
            tmdb_id,
            ..record.clone()
        };
        Ok(Some(row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_server::{Reply, TestServer};

    fn record(id: u64, title: &str, genres: &[u32]) -> MovieRecord {
        MovieRecord {
            tmdb_id: id,
            title: title.to_string(),
            poster_path: None,
            genre_ids: genres.to_vec(),
            hashtags: crate::data::hashtags_for(genres),
        }
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous_rows() {
        let store = MemoryMovieStore::with_records(vec![record(1, "Old", &[35])]);

        store
            .replace_all(&[record(2, "New A", &[27]), record(3, "New B", &[27])])
            .await
            .unwrap();

        let rows = store.all().await.unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.tmdb_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_get_by_tmdb_id() {
        let store = MemoryMovieStore::with_records(vec![record(694, "The Shining", &[27])]);

        assert_eq!(store.get(694).await.unwrap().unwrap().title, "The Shining");
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_tmdb_id() {
        let store = MemoryMovieStore::with_records(vec![record(5, "Before", &[18])]);

        let updated = store
            .update(5, &record(999, "After", &[35]))
            .await
            .unwrap()
            .expect("row should match");

        assert_eq!(updated.tmdb_id, 5);
        assert_eq!(updated.title, "After");
        assert_eq!(store.get(5).await.unwrap().unwrap().genre_ids, vec![35]);
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryMovieStore::new();
        assert!(store.update(5, &record(5, "X", &[])).await.unwrap().is_none());
    }

    fn backend_for(server: &TestServer) -> BackendStore {
        BackendStore::with_client(Client::new(), server.base_url.clone())
    }

    const SHINING_ROW: &str = r##"{"id": 1, "tmdb_id": 694, "title": "The Shining",
        "poster_path": null, "genre_ids": [27], "hashtags": ["#horror"]}"##;

    #[tokio::test]
    async fn test_backend_get_missing_is_none() {
        let server = TestServer::start(vec![Reply::Json(404, r#"{"error": "not found"}"#)]).await;

        let result = backend_for(&server).get(694).await.unwrap();

        assert!(result.is_none());
        assert!(server.requests()[0].starts_with("GET /api/movies/694 "));
    }

    #[tokio::test]
    async fn test_backend_get_existing_row() {
        let server = TestServer::start(vec![Reply::Json(200, SHINING_ROW)]).await;

        let row = backend_for(&server).get(694).await.unwrap().expect("row expected");

        assert_eq!(row.title, "The Shining");
        assert_eq!(row.hashtags, vec!["#horror"]);
    }

    #[tokio::test]
    async fn test_backend_update_empty_body_is_none() {
        let server = TestServer::start(vec![Reply::Json(200, "")]).await;

        let result = backend_for(&server)
            .update(694, &record(694, "Shining", &[18]))
            .await
            .unwrap();

        assert!(result.is_none());
        let request = &server.requests()[0];
        assert!(request.starts_with("PUT /api/movies/694 "));
        assert!(request.contains(r#""title":"Shining""#));
        assert!(request.contains(r##""hashtags":["#drama"]"##));
    }

    #[tokio::test]
    async fn test_backend_update_returns_row() {
        let server = TestServer::start(vec![Reply::Json(200, SHINING_ROW)]).await;

        let row = backend_for(&server)
            .update(694, &record(694, "The Shining", &[27]))
            .await
            .unwrap();

        assert_eq!(row.map(|r| r.tmdb_id), Some(694));
    }

    #[tokio::test]
    async fn test_backend_error_status_keeps_body() {
        let server = TestServer::start(vec![Reply::Json(500, r#"{"error": "db down"}"#)]).await;

        let err = backend_for(&server).all().await.unwrap_err();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("db down"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_replace_all_deletes_then_posts() {
        let server = TestServer::start(vec![
            Reply::Json(200, r#"{"message": "deleted"}"#),
            Reply::Json(201, SHINING_ROW),
        ])
        .await;

        backend_for(&server)
            .replace_all(&[record(694, "The Shining", &[27])])
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("DELETE /api/movies "));
        assert!(requests[1].starts_with("POST /api/movies "));
        assert!(requests[1].contains(r#""tmdb_id":694"#));
    }

    #[test]
    fn test_backend_urls() {
        let store = BackendStore::with_client(Client::new(), "http://localhost:5000/api/");
        assert_eq!(store.movies_url(), "http://localhost:5000/api/movies");
        assert_eq!(store.movie_url(694), "http://localhost:5000/api/movies/694");
    }
}
