//! Query TMDB through the app's client and print what the screens would read.
//! Usage:
//!   cargo run --bin tmdb_probe -- search <keyword>
//!   cargo run --bin tmdb_probe -- genre <genre_id>
//!   cargo run --bin tmdb_probe -- movie <tmdb_id>
//!   cargo run --bin tmdb_probe -- genres
//!   cargo run --bin tmdb_probe -- popular
//! Requires TMDB_ACCESS_TOKEN in the environment (.env supported).

use anyhow::{Context, Result};
use cinepick::config::{DEFAULT_API_BASE, DEFAULT_IMAGE_BASE};
use cinepick::grid::Grid;
use cinepick::models::Movie;
use cinepick::tmdb::{image_url, TmdbApi, TmdbClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Search,
    Genre,
    Movie,
    Genres,
    Popular,
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" => Ok(Probe::Search),
            "genre" => Ok(Probe::Genre),
            "movie" => Ok(Probe::Movie),
            "genres" => Ok(Probe::Genres),
            "popular" => Ok(Probe::Popular),
            _ => Err(anyhow::anyhow!(
                "probe must be one of: search, genre, movie, genres, popular"
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin tmdb_probe -- search <keyword>");
        eprintln!("       cargo run --bin tmdb_probe -- genre <genre_id>");
        eprintln!("       cargo run --bin tmdb_probe -- movie <tmdb_id>");
        eprintln!("       cargo run --bin tmdb_probe -- genres | popular");
        std::process::exit(1);
    }

    let probe = Probe::from_str(&args[1])?;
    let argument = || {
        args.get(2)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing argument for {:?}", probe))
    };

    let token = env::var("TMDB_ACCESS_TOKEN").context("TMDB_ACCESS_TOKEN not set")?;
    let api_base = env::var("TMDB_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let image_base =
        env::var("TMDB_IMAGE_BASE").unwrap_or_else(|_| DEFAULT_IMAGE_BASE.to_string());
    let client = TmdbClient::new(api_base, token)?;

    let output = match probe {
        Probe::Search => list_output(&client.search_movies(&argument()?).await?, &image_base),
        Probe::Genre => {
            let id: i64 = argument()?.parse().context("genre_id must be an integer")?;
            list_output(&client.discover_by_genre(id).await?, &image_base)
        }
        Probe::Popular => list_output(&client.popular().await?, &image_base),
        Probe::Genres => serde_json::to_value(client.genres().await?)?,
        Probe::Movie => {
            let id: i64 = argument()?.parse().context("tmdb_id must be an integer")?;
            let (details, recommendations) =
                tokio::try_join!(client.movie(id), client.recommendations(id))?;
            json!({
                "details": details,
                "poster": image_url(&image_base, details.movie.poster_path.as_deref()),
                "backdrop": image_url(&image_base, details.movie.backdrop_path.as_deref()),
                "year": details.movie.release_year(),
                "recommendations": recommendations.iter().map(|m| &m.title).collect::<Vec<_>>(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn list_output(movies: &[Movie], image_base: &str) -> serde_json::Value {
    let grid = Grid::new(movies, 2, image_base);
    json!({
        "count": movies.len(),
        "cards": grid.cards().collect::<Vec<_>>(),
    })
}
