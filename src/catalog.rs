//! Catalog loading: cache, remote fetch with retry, store fallback
//!
//! `CatalogLoader::load_category` is the read path used by every listing:
//!
//! 1. A fresh cache entry for `(genre, locale)` is returned as is.
//! 2. Otherwise the remote API is queried through the retry policy. The
//!    normalized list replaces the persisted movie collection and is written
//!    back to the cache.
//! 3. If the remote read ultimately fails, the persisted collection is
//!    filtered by genre. An empty result is reported as `NoData`, a non-empty
//!    one as `Degraded`.
//!
//! The persisted collection is not partitioned by genre, so concurrent loads
//! of different genres overwrite each other's rows.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::data::tmdb::find_trailer;
use crate::data::{
    filter_by_rating, hashtag_for, Locale, Movie, MovieRecord, MovieSource, MovieStore, Video,
};
use crate::error::{CatalogError, FetchError, Result};
use crate::retry::{RetryAttempt, RetryObserver, RetryPolicy};

/// Cache key for a genre listing in a locale, e.g. `movies_27_en`
pub fn cache_key(genre: u32, locale: Locale) -> String {
    format!("movies_{}_{}", genre, locale.code())
}

/// Result of loading a genre listing
#[derive(Debug)]
pub enum LoadOutcome {
    /// Served from a fresh cache entry
    Cached(Vec<Movie>),
    /// Fetched from the remote API
    Fresh(Vec<Movie>),
    /// Remote failed; showing stored movies instead
    Degraded { movies: Vec<Movie>, cause: FetchError },
    /// Remote failed and the store has nothing for this genre
    NoData { cause: FetchError },
}

impl LoadOutcome {
    pub fn movies(&self) -> &[Movie] {
        match self {
            LoadOutcome::Cached(movies)
            | LoadOutcome::Fresh(movies)
            | LoadOutcome::Degraded { movies, .. } => movies,
            LoadOutcome::NoData { .. } => &[],
        }
    }

}

/// Fields an administrator may change on a stored movie
#[derive(Debug, Clone, PartialEq)]
pub struct MovieEdit {
    pub title: String,
    pub poster_path: Option<String>,
    pub genre: u32,
}

/// Loads, searches and edits the movie catalog
#[derive(Clone)]
pub struct CatalogLoader {
    source: Arc<dyn MovieSource>,
    store: Arc<dyn MovieStore>,
    cache: CacheManager,
    retry: RetryPolicy,
}

impl CatalogLoader {
    pub fn new(
        source: Arc<dyn MovieSource>,
        store: Arc<dyn MovieStore>,
        cache: CacheManager,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            retry,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Loads a genre listing without progress reporting
    pub async fn load_category(&self, genre: u32, locale: Locale) -> Result<LoadOutcome> {
        self.load_category_with(genre, locale, None).await
    }

    /// Loads a genre listing, notifying `observer` before each rate-limit delay
    ///
    /// # Returns
    /// * `Ok(LoadOutcome)` - movies and where they came from
    /// * `Err(CatalogError::Unavailable)` - both the remote API and the store failed
    pub async fn load_category_with(
        &self,
        genre: u32,
        locale: Locale,
        observer: Option<&mut (dyn RetryObserver + Send)>,
    ) -> Result<LoadOutcome> {
        let key = cache_key(genre, locale);

        if let Some(movies) = self.cache.get::<Vec<Movie>>(&key) {
            info!(key = %key, count = movies.len(), "Using cached movies");
            return Ok(LoadOutcome::Cached(movies));
        }

        info!(genre, locale = locale.code(), "Fetching movies from remote API");
        match self.fetch_remote(genre, locale, observer).await {
            Ok(movies) => {
                self.persist(&key, &movies).await;
                Ok(LoadOutcome::Fresh(movies))
            }
            Err(cause) => {
                warn!(genre, error = %cause, "Remote fetch failed, falling back to stored movies");
                self.fall_back(genre, cause).await
            }
        }
    }

    /// Drops the cache entry for `(genre, locale)` and loads it again
    pub async fn refresh_category(&self, genre: u32, locale: Locale) -> Result<LoadOutcome> {
        self.refresh_category_with(genre, locale, None).await
    }

    pub async fn refresh_category_with(
        &self,
        genre: u32,
        locale: Locale,
        observer: Option<&mut (dyn RetryObserver + Send)>,
    ) -> Result<LoadOutcome> {
        self.cache.invalidate(&cache_key(genre, locale))?;
        self.load_category_with(genre, locale, observer).await
    }

    /// Loads several genres concurrently
    ///
    /// `report` receives the genre and attempt before each rate-limit delay.
    /// Results come back in the order of `genres`.
    pub async fn load_many<R>(
        &self,
        genres: &[u32],
        locale: Locale,
        refresh: bool,
        report: R,
    ) -> Vec<(u32, Result<LoadOutcome>)>
    where
        R: Fn(u32, &RetryAttempt) + Sync,
    {
        let report = &report;
        let loads = genres.iter().map(|&genre| async move {
            let mut observer = move |attempt: &RetryAttempt| report(genre, attempt);
            let result = if refresh {
                self.refresh_category_with(genre, locale, Some(&mut observer))
                    .await
            } else {
                self.load_category_with(genre, locale, Some(&mut observer))
                    .await
            };
            (genre, result)
        });
        join_all(loads).await
    }

    async fn fetch_remote(
        &self,
        genre: u32,
        locale: Locale,
        observer: Option<&mut (dyn RetryObserver + Send)>,
    ) -> std::result::Result<Vec<Movie>, FetchError> {
        let source = &self.source;
        let page = self
            .retry
            .run(|| source.discover(genre, locale), observer)
            .await?;

        let results = page
            .results
            .ok_or_else(|| FetchError::UpstreamDataMissing("results".to_string()))?;

        Ok(results.into_iter().map(Movie::from_remote).collect())
    }

    /// Replaces the stored collection and writes the cache entry.
    ///
    /// Failures are logged; the fetched list is still returned to the caller.
    async fn persist(&self, key: &str, movies: &[Movie]) {
        let records: Vec<MovieRecord> = movies.iter().map(MovieRecord::from).collect();
        match self.store.replace_all(&records).await {
            Ok(()) => info!(count = records.len(), "Replaced stored movies"),
            Err(err) => warn!(error = %err, "Failed to replace stored movies"),
        }

        if let Err(err) = self.cache.put(key, movies) {
            warn!(key, error = %err, "Failed to write cache entry");
        }
    }

    async fn fall_back(&self, genre: u32, cause: FetchError) -> Result<LoadOutcome> {
        let rows = match self.store.all().await {
            Ok(rows) => rows,
            Err(store) => {
                warn!(error = %store, "Movie store unavailable");
                return Err(CatalogError::Unavailable {
                    upstream: cause,
                    store,
                });
            }
        };

        let movies: Vec<Movie> = rows
            .into_iter()
            .map(Movie::from)
            .filter(|movie| movie.has_genre(genre))
            .collect();

        if movies.is_empty() {
            info!(genre, "No stored movies for genre");
            Ok(LoadOutcome::NoData { cause })
        } else {
            info!(genre, count = movies.len(), "Showing stored movies");
            Ok(LoadOutcome::Degraded { movies, cause })
        }
    }

    /// Searches stored movies by title or hashtag.
    ///
    /// An empty query returns nothing. `min_rating > 0` additionally requires
    /// `vote_average >= min_rating`.
    pub async fn search(&self, query: &str, min_rating: f64) -> Result<Vec<Movie>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let matches: Vec<Movie> = self
            .store
            .all()
            .await?
            .into_iter()
            .map(Movie::from)
            .filter(|movie| movie.matches(&query))
            .collect();

        Ok(filter_by_rating(&matches, min_rating))
    }

    /// Finds the first YouTube trailer for a movie
    pub async fn trailer(&self, movie_id: u64, locale: Locale) -> Result<Option<Video>> {
        let source = &self.source;
        let videos = self
            .retry
            .run(|| source.videos(movie_id, locale), None)
            .await?;
        Ok(find_trailer(&videos).cloned())
    }

    /// Updates a stored movie's title, poster and genre.
    ///
    /// The genre replaces all previous genres and its hashtag replaces all
    /// previous hashtags.
    pub async fn edit_movie(&self, tmdb_id: u64, edit: MovieEdit) -> Result<MovieRecord> {
        if self.store.get(tmdb_id).await?.is_none() {
            return Err(CatalogError::NotFound(tmdb_id));
        }

        let record = MovieRecord {
            tmdb_id,
            title: edit.title,
            poster_path: edit.poster_path,
            genre_ids: vec![edit.genre],
            hashtags: vec![hashtag_for(edit.genre).to_string()],
        };

        let updated = self
            .store
            .update(tmdb_id, &record)
            .await?
            .ok_or(CatalogError::NotFound(tmdb_id))?;
        info!(tmdb_id, "Movie updated");
        Ok(updated)
    }
}
