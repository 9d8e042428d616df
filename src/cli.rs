//! Command-line interface parsing for moviecat
//!
//! This module handles parsing of CLI arguments using clap and validates the
//! genre and language values before any network call is made.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::genres::DEFAULT_GENRE_ID;
use crate::data::{get_genre_by_id, Locale, Movie};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The language code is not supported
    #[error("Invalid language: '{0}'. Valid languages: en, ru")]
    InvalidLocale(String),

    /// The genre id is not in the genre table
    #[error("Invalid genre id: {0}. Run `moviecat genres` to list valid ids")]
    InvalidGenre(u32),
}

/// moviecat - Browse a movie catalog by genre with a local cache
#[derive(Parser, Debug)]
#[command(name = "moviecat")]
#[command(about = "Movie catalog browser with rate-limit aware fetching and a local cache")]
#[command(version)]
pub struct Cli {
    /// Backend API root serving /movies and the /tmdb proxy
    #[arg(long, global = true, env = "MOVIECAT_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory for cached listings (defaults to the XDG cache dir)
    #[arg(long, global = true, env = "MOVIECAT_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep cached listings in memory only
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Maximum attempts per API request
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Base delay between attempts in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// How long cached listings stay fresh, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// Display language (en, ru)
    #[arg(long, global = true, default_value = "en", value_name = "LANG")]
    pub lang: String,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List movies for one or more genres
    Movies {
        /// Genre id; repeat to load several genres concurrently
        #[arg(short, long = "genre", value_name = "ID", default_values_t = [DEFAULT_GENRE_ID])]
        genres: Vec<u32>,

        /// Only show movies rated at least this high
        #[arg(long, default_value_t = 0.0, value_name = "RATING")]
        min_rating: f64,

        /// Ignore cached listings and fetch again
        #[arg(long)]
        refresh: bool,
    },

    /// Search stored movies by title or hashtag
    Search {
        query: String,

        /// Only show movies rated at least this high
        #[arg(long, default_value_t = 0.0, value_name = "RATING")]
        min_rating: f64,
    },

    /// Show the YouTube trailer of a movie
    Trailer {
        /// Movie database id
        tmdb_id: u64,
    },

    /// List the available genres
    Genres,

    /// Edit a stored movie
    Edit {
        /// Movie database id
        tmdb_id: u64,

        #[arg(long)]
        title: String,

        /// Poster path or image URL
        #[arg(long)]
        poster: Option<String>,

        /// New genre id; replaces all previous genres
        #[arg(long, value_name = "ID")]
        genre: u32,
    },

    /// Manage cached listings
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CacheCommand {
    /// Drop cached listings so the next load fetches again
    Clear {
        /// Genre id to clear; repeat for several
        #[arg(short, long = "genre", value_name = "ID", required = true)]
        genres: Vec<u32>,
    },
}

/// Parses a language argument into a Locale.
///
/// # Returns
/// * `Ok(Locale)` if the code is supported
/// * `Err(CliError::InvalidLocale)` otherwise
pub fn parse_locale_arg(s: &str) -> Result<Locale, CliError> {
    Locale::from_str(s).ok_or_else(|| CliError::InvalidLocale(s.to_string()))
}

/// Checks that a genre id is in the genre table
pub fn parse_genre_arg(id: u32) -> Result<u32, CliError> {
    get_genre_by_id(id)
        .map(|genre| genre.id)
        .ok_or(CliError::InvalidGenre(id))
}

/// Validates every genre id named by the command
pub fn validate_genres(command: &Command) -> Result<(), CliError> {
    match command {
        Command::Movies { genres, .. }
        | Command::Cache {
            action: CacheCommand::Clear { genres },
        } => {
            for &id in genres {
                parse_genre_arg(id)?;
            }
            Ok(())
        }
        Command::Edit { genre, .. } => parse_genre_arg(*genre).map(|_| ()),
        Command::Search { .. } | Command::Trailer { .. } | Command::Genres => Ok(()),
    }
}

/// Formats one movie as a listing line: id, rating, title and hashtags
pub fn format_movie_line(movie: &Movie) -> String {
    let rating = if movie.vote_average > 0.0 {
        format!("{:.1}", movie.vote_average)
    } else {
        "-".to_string()
    };
    let mut line = format!("{:>8}  {:>4}  {}", movie.id, rating, movie.title);
    if !movie.hashtags.is_empty() {
        line.push_str("  ");
        line.push_str(&movie.hashtags.join(" "));
    }
    line
}
