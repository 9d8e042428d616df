//! Static table of the movie genres the catalog browses by
//!
//! Ids are the remote API's genre ids. Each genre has an English and a
//! Russian display name and one hashtag used to tag movies.

use serde::Serialize;

use super::Locale;

/// Hashtag given to genre ids missing from the table
pub const UNKNOWN_HASHTAG: &str = "#unknown";

/// A browsable movie genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Genre {
    /// Remote API genre id
    pub id: u32,
    /// English display name
    pub name_en: &'static str,
    /// Russian display name
    pub name_ru: &'static str,
    /// Tag attached to movies of this genre
    pub hashtag: &'static str,
}

impl Genre {
    /// Display name in the given locale
    pub fn name(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.name_en,
            Locale::Ru => self.name_ru,
        }
    }
}

/// Genre shown when no category is chosen (Horror)
pub const DEFAULT_GENRE_ID: u32 = 27;

static GENRES: [Genre; 19] = [
    Genre { id: 28, name_en: "Action", name_ru: "Экшен", hashtag: "#action" },
    Genre { id: 12, name_en: "Adventure", name_ru: "Приключения", hashtag: "#adventure" },
    Genre { id: 16, name_en: "Animation", name_ru: "Анимация", hashtag: "#animation" },
    Genre { id: 35, name_en: "Comedy", name_ru: "Комедия", hashtag: "#comedy" },
    Genre { id: 80, name_en: "Crime", name_ru: "Криминал", hashtag: "#crime" },
    Genre { id: 99, name_en: "Documentary", name_ru: "Документальный", hashtag: "#documentary" },
    Genre { id: 18, name_en: "Drama", name_ru: "Драма", hashtag: "#drama" },
    Genre { id: 10751, name_en: "Family", name_ru: "Семейный", hashtag: "#family" },
    Genre { id: 14, name_en: "Fantasy", name_ru: "Фэнтези", hashtag: "#fantasy" },
    Genre { id: 36, name_en: "History", name_ru: "Исторический", hashtag: "#history" },
    Genre { id: 27, name_en: "Horror", name_ru: "Ужасы", hashtag: "#horror" },
    Genre { id: 10402, name_en: "Music", name_ru: "Музыкальный", hashtag: "#music" },
    Genre { id: 9648, name_en: "Mystery", name_ru: "Мистика", hashtag: "#mystery" },
    Genre { id: 10749, name_en: "Romance", name_ru: "Романтика", hashtag: "#romance" },
    Genre { id: 878, name_en: "Science Fiction", name_ru: "Научная фантастика", hashtag: "#scifi" },
    Genre { id: 10770, name_en: "TV Movie", name_ru: "ТВ-фильм", hashtag: "#tvmovie" },
    Genre { id: 53, name_en: "Thriller", name_ru: "Триллер", hashtag: "#thriller" },
    Genre { id: 10752, name_en: "War", name_ru: "Военный", hashtag: "#war" },
    Genre { id: 37, name_en: "Western", name_ru: "Вестерн", hashtag: "#western" },
];

/// Returns all genres in display order
pub fn all_genres() -> &'static [Genre] {
    &GENRES
}

/// Looks up a genre by its remote id
pub fn get_genre_by_id(id: u32) -> Option<&'static Genre> {
    GENRES.iter().find(|genre| genre.id == id)
}

/// Hashtag for a genre id, `#unknown` when the id is not in the table
pub fn hashtag_for(id: u32) -> &'static str {
    get_genre_by_id(id).map_or(UNKNOWN_HASHTAG, |genre| genre.hashtag)
}

/// Hashtags for a list of genre ids, in the same order
pub fn hashtags_for(ids: &[u32]) -> Vec<String> {
    ids.iter().map(|&id| hashtag_for(id).to_string()).collect()
}
