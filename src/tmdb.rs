use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Genre, GenreList, Movie, MovieDetails, Paged};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Remote catalog lookups. Results come back in upstream order.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<Movie>>;
    async fn discover_by_genre(&self, genre_id: i64) -> Result<Vec<Movie>>;
    async fn genres(&self) -> Result<Vec<Genre>>;
    async fn movie(&self, id: i64) -> Result<MovieDetails>;
    async fn recommendations(&self, id: i64) -> Result<Vec<Movie>>;
    async fn popular(&self) -> Result<Vec<Movie>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_base: String,
    access_token: String,
}

impl TmdbClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cinepick/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Network(format!("failed to build TMDB HTTP client: {e}")))?;
        let api_base: String = api_base.into();
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base.clone(), config.access_token.clone())
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.api_base, path_and_query);
        debug!(url = %url, "TMDB request");
        let res = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Network(format!("request to {path_and_query} failed: {e}")))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Error::Network(format!("reading body of {path_and_query} failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Network(format!("{path_and_query} -> {status}: {text}")));
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::Parse(format!("{path_and_query}: {e}")))
    }

    async fn get_movie_list(&self, path_and_query: &str) -> Result<Vec<Movie>> {
        let page: Paged<Movie> = self.get_json(path_and_query).await?;
        for movie in &page.results {
            movie.validate()?;
        }
        debug!(
            path = path_and_query,
            count = page.results.len(),
            total = page.total_results,
            "TMDB list"
        );
        Ok(page.results)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<Movie>> {
        let path = format!("/search/movie?query={}", urlencoding::encode(query));
        self.get_movie_list(&path).await
    }

    async fn discover_by_genre(&self, genre_id: i64) -> Result<Vec<Movie>> {
        self.get_movie_list(&format!("/discover/movie?with_genres={genre_id}"))
            .await
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        let list: GenreList = self.get_json("/genre/movie/list").await?;
        Ok(list.genres)
    }

    async fn movie(&self, id: i64) -> Result<MovieDetails> {
        let details: MovieDetails = self.get_json(&format!("/movie/{id}")).await?;
        details.movie.validate()?;
        Ok(details)
    }

    async fn recommendations(&self, id: i64) -> Result<Vec<Movie>> {
        self.get_movie_list(&format!("/movie/{id}/recommendations"))
            .await
    }

    async fn popular(&self) -> Result<Vec<Movie>> {
        self.get_movie_list("/movie/popular?language=en-US&page=1")
            .await
    }
}

/// Joins the image CDN base with a record's relative poster or backdrop path.
pub fn image_url(image_base: &str, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let base = image_base.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{base}{path}"))
    } else {
        Some(format!("{base}/{path}"))
    }
}

pub fn genre_name(genres: &[Genre], genre_id: i64) -> Option<&str> {
    genres
        .iter()
        .find(|g| g.id == genre_id)
        .map(|g| g.name.as_str())
}
