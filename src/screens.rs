//! Per-screen controllers.
//!
//! Each controller calls the catalog or the favorites store on its lifecycle
//! event (mount, focus, submit) and keeps the resulting transient UI state.
//! Errors never escape a controller: they become a `Failed` state and are
//! logged.

use crate::favorites::FavoritesStore;
use crate::grid::{format_rating, Grid};
use crate::models::{Genre, MovieDetails};
use crate::tmdb::{genre_name, image_url, TmdbApi};
use serde::Serialize;
use tracing::{debug, warn};

pub const NO_FAVORITES_MESSAGE: &str = "No favorite movies found.";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed { message: String },
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }

    fn from_result(result: crate::Result<T>, context: &str) -> Self {
        match result {
            Ok(v) => LoadState::Loaded(v),
            Err(e) => {
                warn!("{} failed ({}): {}", context, e.kind(), e);
                LoadState::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchScreen {
    pub keyword: String,
    pub results: LoadState<Grid>,
    #[serde(skip)]
    image_base: String,
}

impl SearchScreen {
    pub const COLUMNS: usize = 3;

    pub fn new(image_base: &str) -> Self {
        Self {
            keyword: String::new(),
            results: LoadState::Idle,
            image_base: image_base.to_string(),
        }
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.keyword = keyword.into();
    }

    /// Runs the keyword search. A blank keyword resets to `Idle`.
    pub async fn submit(&mut self, api: &dyn TmdbApi) {
        let keyword = self.keyword.trim().to_string();
        if keyword.is_empty() {
            self.results = LoadState::Idle;
            return;
        }
        self.results = LoadState::Loading;
        debug!(keyword = %keyword, "Searching");
        let result = api
            .search_movies(&keyword)
            .await
            .map(|movies| Grid::new(&movies, Self::COLUMNS, &self.image_base));
        self.results = LoadState::from_result(result, "Search");
    }

    /// Number of result cards; a failed search counts as zero.
    pub fn result_count(&self) -> usize {
        self.results.loaded().map(Grid::card_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreListScreen {
    pub genres: LoadState<Vec<Genre>>,
}

impl GenreListScreen {
    pub async fn mount(api: &dyn TmdbApi) -> Self {
        Self {
            genres: LoadState::from_result(api.genres().await, "Genre list"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScreen {
    pub genre_id: i64,
    pub genre_name: String,
    pub title: String,
    pub subtitle: String,
    pub movies: LoadState<Grid>,
    #[serde(skip)]
    image_base: String,
}

impl CategoryScreen {
    pub const COLUMNS: usize = 2;

    pub fn new(genre_id: i64, image_base: &str) -> Self {
        Self {
            genre_id,
            genre_name: String::new(),
            title: "Category: ".to_string(),
            subtitle: "0 Movies".to_string(),
            movies: LoadState::Idle,
            image_base: image_base.to_string(),
        }
    }

    /// Fetches the genre table and the genre's movies together. A failed name
    /// lookup leaves the name blank without failing the list.
    pub async fn mount(&mut self, api: &dyn TmdbApi) {
        self.movies = LoadState::Loading;
        let (genres, movies) = tokio::join!(api.genres(), api.discover_by_genre(self.genre_id));

        match genres {
            Ok(genres) => {
                if let Some(name) = genre_name(&genres, self.genre_id) {
                    self.genre_name = name.to_string();
                }
            }
            Err(e) => warn!("Genre name lookup failed for {}: {}", self.genre_id, e),
        }

        let result = movies.map(|m| Grid::new(&m, Self::COLUMNS, &self.image_base));
        self.movies = LoadState::from_result(result, "Discover by genre");

        let count = self.movies.loaded().map(Grid::card_count).unwrap_or(0);
        self.title = format!("Category: {}", self.genre_name);
        self.subtitle = format!("{} Movies", count);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailView {
    pub details: MovieDetails,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: String,
    pub release_year: Option<i32>,
}

impl DetailView {
    fn new(details: MovieDetails, image_base: &str) -> Self {
        Self {
            poster_url: image_url(image_base, details.movie.poster_path.as_deref()),
            backdrop_url: image_url(image_base, details.movie.backdrop_path.as_deref()),
            rating: format_rating(details.movie.vote_average),
            release_year: details.movie.release_year(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailScreen {
    pub movie_id: i64,
    pub movie: LoadState<DetailView>,
    pub is_favorite: bool,
    pub favorite_error: Option<String>,
    pub recommendations: LoadState<Grid>,
    #[serde(skip)]
    image_base: String,
}

impl DetailScreen {
    pub const COLUMNS: usize = 3;

    pub fn new(movie_id: i64, image_base: &str) -> Self {
        Self {
            movie_id,
            movie: LoadState::Idle,
            is_favorite: false,
            favorite_error: None,
            recommendations: LoadState::Idle,
            image_base: image_base.to_string(),
        }
    }

    /// Loads details, favorite status and recommendations concurrently.
    pub async fn mount(&mut self, api: &dyn TmdbApi, favorites: &FavoritesStore) {
        self.movie = LoadState::Loading;
        self.recommendations = LoadState::Loading;
        let id = self.movie_id;
        let (details, favorite, recommendations) = tokio::join!(
            api.movie(id),
            favorites.is_favorite(id),
            api.recommendations(id)
        );

        self.apply_details(details, favorite);
        self.recommendations = LoadState::from_result(
            recommendations.map(|m| Grid::new(&m, Self::COLUMNS, &self.image_base)),
            "Recommendations",
        );
    }

    /// Loads only details and favorite status; recommendations stay idle.
    pub async fn load_movie(&mut self, api: &dyn TmdbApi, favorites: &FavoritesStore) {
        self.movie = LoadState::Loading;
        let id = self.movie_id;
        let (details, favorite) = tokio::join!(api.movie(id), favorites.is_favorite(id));
        self.apply_details(details, favorite);
    }

    fn apply_details(
        &mut self,
        details: crate::Result<MovieDetails>,
        favorite: crate::Result<bool>,
    ) {
        self.movie = LoadState::from_result(
            details.map(|d| DetailView::new(d, &self.image_base)),
            "Movie detail",
        );
        match favorite {
            Ok(is_favorite) => self.is_favorite = is_favorite,
            Err(e) => {
                warn!("Favorite check failed for {}: {}", self.movie_id, e);
                self.favorite_error = Some(e.to_string());
            }
        }
    }

    /// Adds or removes the loaded movie. Does nothing until details loaded.
    pub async fn toggle_favorite(&mut self, favorites: &FavoritesStore) {
        let Some(view) = self.movie.loaded() else {
            debug!(movie_id = self.movie_id, "Toggle ignored, movie not loaded");
            return;
        };
        match favorites.toggle(view.details.movie.clone()).await {
            Ok(now_favorite) => {
                self.is_favorite = now_favorite;
                self.favorite_error = None;
            }
            Err(e) => {
                warn!("Favorite toggle failed for {}: {}", self.movie_id, e);
                self.favorite_error = Some(e.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoritesScreen {
    pub favorites: LoadState<Grid>,
    pub message: Option<String>,
    #[serde(skip)]
    image_base: String,
}

impl FavoritesScreen {
    pub const COLUMNS: usize = 2;

    pub fn new(image_base: &str) -> Self {
        Self {
            favorites: LoadState::Idle,
            message: None,
            image_base: image_base.to_string(),
        }
    }

    /// Reloads the stored favorites, padding the last row.
    pub async fn focus(&mut self, store: &FavoritesStore) {
        self.favorites = LoadState::Loading;
        let result = store
            .list()
            .await
            .map(|movies| Grid::padded(&movies, Self::COLUMNS, &self.image_base));
        self.favorites = LoadState::from_result(result, "Favorites");
        self.message = match self.favorites.loaded() {
            Some(grid) if grid.card_count() == 0 => Some(NO_FAVORITES_MESSAGE.to_string()),
            _ => None,
        };
    }

    pub async fn remove(&mut self, store: &FavoritesStore, movie_id: i64) {
        if let Err(e) = store.remove(movie_id).await {
            warn!("Removing favorite {} failed: {}", movie_id, e);
        }
        self.focus(store).await;
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularScreen {
    pub movies: LoadState<Grid>,
}

impl PopularScreen {
    pub const COLUMNS: usize = 3;

    pub async fn mount(api: &dyn TmdbApi, image_base: &str) -> Self {
        let result = api
            .popular()
            .await
            .map(|m| Grid::new(&m, Self::COLUMNS, image_base));
        Self {
            movies: LoadState::from_result(result, "Popular"),
        }
    }
}
