use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::screens::{
    CategoryScreen, DetailScreen, FavoritesScreen, GenreListScreen, PopularScreen, SearchScreen,
};
use crate::storage::FileStorage;
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub favorites: Arc<FavoritesStore>,
    pub image_base: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> =
        Arc::new(TmdbClient::from_config(&config).context("Failed to build TMDB client")?);
    let storage = FileStorage::open(&config.storage_dir)
        .await
        .context("Failed to open favorites storage")?;
    let favorites = Arc::new(
        FavoritesStore::open(Arc::new(storage))
            .await
            .context("Failed to open favorites store")?,
    );
    info!("Using TMDB at {}", config.api_base);

    let state = AppState {
        tmdb,
        favorites: favorites.clone(),
        image_base: config.image_base.clone(),
    };
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    favorites.close().await;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/popular", get(popular))
        .route("/categories", get(categories))
        .route("/categories/:genre_id", get(category))
        .route("/movies/:id", get(movie_detail))
        .route("/movies/:id/favorite", post(toggle_favorite))
        .route("/favorites", get(favorites))
        .route("/favorites/:id", delete(remove_favorite))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Json<SearchScreen> {
    let mut screen = SearchScreen::new(&state.image_base);
    screen.set_keyword(q.query);
    screen.submit(state.tmdb.as_ref()).await;
    Json(screen)
}

async fn popular(State(state): State<AppState>) -> Json<PopularScreen> {
    Json(PopularScreen::mount(state.tmdb.as_ref(), &state.image_base).await)
}

async fn categories(State(state): State<AppState>) -> Json<GenreListScreen> {
    Json(GenreListScreen::mount(state.tmdb.as_ref()).await)
}

async fn category(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
) -> Json<CategoryScreen> {
    let mut screen = CategoryScreen::new(genre_id, &state.image_base);
    screen.mount(state.tmdb.as_ref()).await;
    Json(screen)
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Json<DetailScreen> {
    let mut screen = DetailScreen::new(id, &state.image_base);
    screen.mount(state.tmdb.as_ref(), &state.favorites).await;
    Json(screen)
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<DetailScreen> {
    let mut screen = DetailScreen::new(id, &state.image_base);
    screen.load_movie(state.tmdb.as_ref(), &state.favorites).await;
    screen.toggle_favorite(&state.favorites).await;
    Json(screen)
}

async fn favorites(State(state): State<AppState>) -> Json<FavoritesScreen> {
    let mut screen = FavoritesScreen::new(&state.image_base);
    screen.focus(&state.favorites).await;
    Json(screen)
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<FavoritesScreen> {
    let mut screen = FavoritesScreen::new(&state.image_base);
    screen.remove(&state.favorites, id).await;
    Json(screen)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
