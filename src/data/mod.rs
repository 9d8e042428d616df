//! Core data models for the movie catalog
//!
//! This module contains the movie types shared by the remote API client, the
//! persisted movie store and the cache, plus the locale and genre tables.

pub mod genres;
pub mod store;
pub mod tmdb;

#[cfg(test)]
mod test_server;

pub use genres::{all_genres, get_genre_by_id, hashtag_for, hashtags_for, Genre};
pub use store::{BackendStore, MemoryMovieStore, MovieStore};
pub use tmdb::{DiscoverPage, MovieSource, RemoteMovie, TmdbClient, Video};

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes an explicit JSON `null` as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Languages the catalog can be displayed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// Parses a language code such as `en` or `ru-RU`
    pub fn from_str(s: &str) -> Option<Locale> {
        let lang = s.split(['-', '_']).next()?.to_lowercase();
        match lang.as_str() {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    /// Short code used in cache keys
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    /// Language tag sent to the movie API
    pub fn api_tag(&self) -> String {
        format!("{}-US", self.code())
    }
}

/// A movie as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// External (TMDB) identifier
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Average user rating, 0 when unknown
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Display tags derived from `genre_ids`
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl Movie {
    /// Normalizes a remote record, deriving hashtags from its genres
    pub fn from_remote(remote: RemoteMovie) -> Self {
        let hashtags = hashtags_for(&remote.genre_ids);
        Self {
            id: remote.id,
            title: remote.title,
            poster_path: remote.poster_path,
            genre_ids: remote.genre_ids,
            vote_average: remote.vote_average,
            overview: remote.overview,
            release_date: remote.release_date,
            hashtags,
        }
    }

    pub fn has_genre(&self, genre: u32) -> bool {
        self.genre_ids.contains(&genre)
    }

    /// Case-insensitive match against the title or any hashtag.
    ///
    /// `query` must already be lowercase.
    pub fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self
                .hashtags
                .iter()
                .any(|tag| tag.to_lowercase().contains(query))
    }
}

/// A row of the persisted movie store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub tmdb_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
}

impl From<&Movie> for MovieRecord {
    fn from(movie: &Movie) -> Self {
        Self {
            tmdb_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            genre_ids: movie.genre_ids.clone(),
            hashtags: movie.hashtags.clone(),
        }
    }
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Self {
            id: record.tmdb_id,
            title: record.title,
            poster_path: record.poster_path,
            genre_ids: record.genre_ids,
            vote_average: 0.0,
            overview: None,
            release_date: None,
            hashtags: record.hashtags,
        }
    }
}

/// Keeps movies rated at least `min_rating`. A non-positive threshold keeps everything.
pub fn filter_by_rating(movies: &[Movie], min_rating: f64) -> Vec<Movie> {
    if min_rating <= 0.0 {
        return movies.to_vec();
    }
    movies
        .iter()
        .filter(|movie| movie.vote_average >= min_rating)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u64, title: &str, rating: f64, genres: &[u32]) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: None,
            genre_ids: genres.to_vec(),
            vote_average: rating,
            overview: None,
            release_date: None,
            hashtags: hashtags_for(genres),
        }
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::from_str("en"), Some(Locale::En));
        assert_eq!(Locale::from_str("RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_str("ru-RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_str("de"), None);
        assert_eq!(Locale::from_str(""), None);
    }

    #[test]
    fn test_locale_api_tag() {
        assert_eq!(Locale::En.api_tag(), "en-US");
        assert_eq!(Locale::Ru.api_tag(), "ru-US");
    }

    #[test]
    fn test_from_remote_derives_hashtags() {
        let remote = RemoteMovie {
            id: 694,
            title: "The Shining".to_string(),
            poster_path: Some("/shining.jpg".to_string()),
            genre_ids: vec![27, 53, 4242],
            vote_average: 8.2,
            overview: None,
            release_date: Some("1980-05-23".to_string()),
        };

        let movie = Movie::from_remote(remote);

        assert_eq!(movie.id, 694);
        assert_eq!(movie.hashtags, vec!["#horror", "#thriller", "#unknown"]);
        assert!(movie.has_genre(27));
        assert!(!movie.has_genre(35));
    }

    #[test]
    fn test_matches_title_or_hashtag() {
        let m = movie(1, "Alien", 8.5, &[27, 878]);
        assert!(m.matches("ali"));
        assert!(m.matches("#scifi"));
        assert!(m.matches("horror"));
        assert!(!m.matches("comedy"));
    }

    #[test]
    fn test_record_conversion_keeps_identity() {
        let m = movie(7, "Seven", 8.3, &[80]);
        let record = MovieRecord::from(&m);
        assert_eq!(record.tmdb_id, 7);
        assert_eq!(record.hashtags, vec!["#crime"]);

        let back = Movie::from(record);
        assert_eq!(back.id, 7);
        assert_eq!(back.vote_average, 0.0);
        assert_eq!(back.genre_ids, vec![80]);
    }

    #[test]
    fn test_filter_by_rating() {
        let movies = vec![movie(1, "A", 5.0, &[]), movie(2, "B", 7.5, &[])];

        assert_eq!(filter_by_rating(&movies, 0.0).len(), 2);
        let good = filter_by_rating(&movies, 7.0);
        assert_eq!(good.len(), 1);
        assert_eq!(good[0].id, 2);
    }

    #[test]
    fn test_record_deserializes_backend_row() {
        let json = r##"{"id": 12, "tmdb_id": 694, "title": "The Shining",
                       "poster_path": null, "genre_ids": [27], "hashtags": ["#horror"]}"##;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.tmdb_id, 694);
        assert!(record.poster_path.is_none());
    }

    #[test]
    fn test_record_tolerates_null_arrays() {
        let json = r#"{"tmdb_id": 1, "title": "X", "poster_path": null,
                       "genre_ids": null, "hashtags": null}"#;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        assert!(record.genre_ids.is_empty());
        assert!(record.hashtags.is_empty());
    }
}
