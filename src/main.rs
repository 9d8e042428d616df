//! moviecat - Browse a movie catalog by genre from the terminal
//!
//! Listings come from the movie API through the backend proxy, are cached
//! locally for an hour and fall back to the backend's stored movies when the
//! API is rate limited or down.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use moviecat::catalog::{cache_key, CatalogLoader, LoadOutcome, MovieEdit};
use moviecat::cli::{
    format_movie_line, parse_locale_arg, validate_genres, CacheCommand, Cli, Command,
};
use moviecat::config::Config;
use moviecat::data::{all_genres, filter_by_rating, get_genre_by_id, Locale};
use moviecat::error::report;
use moviecat::logging::init_logging;
use moviecat::retry::RetryAttempt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", report(err.as_ref()));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level) {
        eprintln!("Warning: logging disabled: {}", err);
    }

    // Validate before touching the network
    let locale = parse_locale_arg(&cli.lang)?;
    validate_genres(&cli.command)?;

    if cli.command == Command::Genres {
        print_genres(locale);
        return Ok(());
    }

    let config = Config::from_cli(&cli);
    debug!(?config, "Loaded configuration");
    let loader = config.build_loader()?;

    match cli.command {
        Command::Movies {
            genres,
            min_rating,
            refresh,
        } => {
            list_movies(&loader, &genres, locale, min_rating, refresh).await
        }
        Command::Search { query, min_rating } => {
            let movies = loader.search(&query, min_rating).await?;
            if movies.is_empty() {
                println!("No movies found");
            }
            for movie in &movies {
                println!("{}", format_movie_line(movie));
            }
            Ok(())
        }
        Command::Trailer { tmdb_id } => {
            match loader.trailer(tmdb_id, locale).await? {
                Some(video) => match video.url() {
                    Some(url) => println!("{}", url),
                    None => println!("{}", video.key),
                },
                None => println!("No trailer found"),
            }
            Ok(())
        }
        Command::Edit {
            tmdb_id,
            title,
            poster,
            genre,
        } => {
            let edit = MovieEdit {
                title,
                poster_path: poster,
                genre,
            };
            let record = loader.edit_movie(tmdb_id, edit).await?;
            println!(
                "Updated {}: {} {}",
                record.tmdb_id,
                record.title,
                record.hashtags.join(" ")
            );
            Ok(())
        }
        Command::Cache {
            action: CacheCommand::Clear { genres },
        } => {
            for genre in genres {
                let key = cache_key(genre, locale);
                loader.cache().invalidate(&key)?;
                println!("Cleared {}", key);
            }
            Ok(())
        }
        Command::Genres => Ok(()),
    }
}

fn print_genres(locale: Locale) {
    for genre in all_genres() {
        println!("{:>6}  {:<20} {}", genre.id, genre.name(locale), genre.hashtag);
    }
}

async fn list_movies(
    loader: &CatalogLoader,
    genres: &[u32],
    locale: Locale,
    min_rating: f64,
    refresh: bool,
) -> Result<(), BoxError> {
    let max_attempts = loader.retry_policy().max_attempts();
    let report = |genre: u32, attempt: &RetryAttempt| {
        eprintln!(
            "Rate limit exceeded for genre {}, retrying ({}/{})...",
            genre, attempt.attempt, max_attempts
        );
    };

    let results = loader.load_many(genres, locale, refresh, report).await;
    let multiple = results.len() > 1;
    let mut failed = 0;

    for (genre, result) in results {
        if multiple {
            let name = get_genre_by_id(genre)
                .map(|g| g.name(locale))
                .unwrap_or("Unknown");
            println!("== {} ({}) ==", name, genre);
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("Error: genre {}: {}", genre, moviecat::error::report(&err));
                failed += 1;
                continue;
            }
        };

        match &outcome {
            LoadOutcome::NoData { cause } => {
                eprintln!("Warning: movie API unavailable ({})", cause);
                println!("No movies found");
                continue;
            }
            LoadOutcome::Degraded { cause, .. } => {
                eprintln!(
                    "Warning: movie API unavailable ({}), showing stored movies",
                    cause
                );
            }
            LoadOutcome::Cached(_) | LoadOutcome::Fresh(_) => {}
        }

        let movies = filter_by_rating(outcome.movies(), min_rating);
        if movies.is_empty() {
            println!("No movies found");
        }
        for movie in &movies {
            println!("{}", format_movie_line(movie));
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} genre(s) could not be loaded", failed, genres.len()).into());
    }
    Ok(())
}
