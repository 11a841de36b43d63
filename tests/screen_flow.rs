use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cinepick::app::{build_router, AppState};
use cinepick::favorites::{FavoritesStore, FAVORITES_KEY};
use cinepick::models::{Genre, Movie, MovieDetails};
use cinepick::storage::MemoryStorage;
use cinepick::tmdb::TmdbApi;
use cinepick::Error;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

struct FakeTmdb {
    movies: Vec<Movie>,
    genres: Vec<Genre>,
    offline: bool,
    queries: Mutex<Vec<String>>,
    recommendation_calls: Arc<AtomicUsize>,
}

impl FakeTmdb {
    fn new(movies: Vec<Movie>) -> Self {
        Self {
            movies,
            genres: vec![
                Genre {
                    id: 28,
                    name: "Action".to_string(),
                },
                Genre {
                    id: 18,
                    name: "Drama".to_string(),
                },
            ],
            offline: false,
            queries: Mutex::new(Vec::new()),
            recommendation_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(Vec::new())
        }
    }

    fn check(&self) -> cinepick::Result<()> {
        if self.offline {
            return Err(Error::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn search_movies(&self, query: &str) -> cinepick::Result<Vec<Movie>> {
        self.check()?;
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.movies.clone())
    }
    async fn discover_by_genre(&self, _genre_id: i64) -> cinepick::Result<Vec<Movie>> {
        self.check()?;
        Ok(self.movies.clone())
    }
    async fn genres(&self) -> cinepick::Result<Vec<Genre>> {
        self.check()?;
        Ok(self.genres.clone())
    }
    async fn movie(&self, id: i64) -> cinepick::Result<MovieDetails> {
        self.check()?;
        let movie = self
            .movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| Error::Network(format!("/movie/{id} -> 404 Not Found")))?;
        Ok(MovieDetails {
            movie,
            genres: vec![self.genres[0].clone()],
            runtime: Some(126),
            tagline: Some("Tagline".to_string()),
            status: Some("Released".to_string()),
        })
    }
    async fn recommendations(&self, id: i64) -> cinepick::Result<Vec<Movie>> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.movies.iter().filter(|m| m.id != id).cloned().collect())
    }
    async fn popular(&self) -> cinepick::Result<Vec<Movie>> {
        self.check()?;
        Ok(self.movies.clone())
    }
}

fn movie(id: i64, title: &str, vote_average: f64) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/poster{id}.jpg")),
        backdrop_path: Some(format!("/backdrop{id}.jpg")),
        overview: format!("{title} overview"),
        vote_average,
        vote_count: 1000,
        popularity: 42.0,
        original_language: "en".to_string(),
        release_date: "1989-06-23".to_string(),
    }
}

fn catalog() -> Vec<Movie> {
    vec![
        movie(268, "Batman", 7.23),
        movie(364, "Batman Returns", 6.94),
        movie(155, "The Dark Knight", 8.52),
    ]
}

async fn app_with(tmdb: FakeTmdb, storage: Arc<MemoryStorage>) -> (Router, Arc<FavoritesStore>) {
    let favorites = Arc::new(FavoritesStore::open(storage).await.unwrap());
    let state = AppState {
        tmdb: Arc::new(tmdb),
        favorites: favorites.clone(),
        image_base: IMAGE_BASE.to_string(),
    };
    (build_router(state), favorites)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn card_titles(grid: &Value) -> Vec<String> {
    grid["cells"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["kind"] == "card")
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_check() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_cards_in_upstream_order() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (status, body) = send(&app, "GET", "/search?query=batman").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keyword"], "batman");
    assert_eq!(body["results"]["status"], "loaded");
    let grid = &body["results"]["data"];
    assert_eq!(grid["columns"], 3);
    assert_eq!(
        card_titles(grid),
        vec!["Batman", "Batman Returns", "The Dark Knight"]
    );
    assert_eq!(grid["cells"][0]["rating"], "7.2");
    assert_eq!(grid["cells"][2]["rating"], "8.5");
    assert_eq!(
        grid["cells"][0]["poster_url"],
        "https://image.tmdb.org/t/p/w500/poster268.jpg"
    );
}

#[tokio::test]
async fn failed_search_degrades_to_failed_state() {
    let (app, _) = app_with(FakeTmdb::offline(), Arc::new(MemoryStorage::new())).await;
    let (status, body) = send(&app, "GET", "/search?query=batman").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["status"], "failed");
    assert!(body["results"]["data"]["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn blank_search_is_idle() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (_, body) = send(&app, "GET", "/search").await;
    assert_eq!(body["results"]["status"], "idle");
}

#[tokio::test]
async fn category_shows_genre_name_and_count() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (_, body) = send(&app, "GET", "/categories/28").await;
    assert_eq!(body["genre_name"], "Action");
    assert_eq!(body["title"], "Category: Action");
    assert_eq!(body["subtitle"], "3 Movies");
    assert_eq!(body["movies"]["data"]["columns"], 2);
}

#[tokio::test]
async fn genre_list() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (_, body) = send(&app, "GET", "/categories").await;
    assert_eq!(body["genres"]["status"], "loaded");
    assert_eq!(body["genres"]["data"][1]["name"], "Drama");
}

#[tokio::test]
async fn popular_lists_movies() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (_, body) = send(&app, "GET", "/popular").await;
    assert_eq!(card_titles(&body["movies"]["data"]).len(), 3);
}

#[tokio::test]
async fn detail_then_toggle_favorite() {
    let storage = Arc::new(MemoryStorage::new());
    let (app, favorites) = app_with(FakeTmdb::new(catalog()), storage.clone()).await;

    let (_, body) = send(&app, "GET", "/movies/155").await;
    assert_eq!(body["movie"]["status"], "loaded");
    assert_eq!(body["movie"]["data"]["details"]["title"], "The Dark Knight");
    assert_eq!(body["movie"]["data"]["details"]["runtime"], 126);
    assert_eq!(body["movie"]["data"]["release_year"], 1989);
    assert_eq!(body["is_favorite"], false);
    assert_eq!(card_titles(&body["recommendations"]["data"]).len(), 2);

    let (_, body) = send(&app, "POST", "/movies/155/favorite").await;
    assert_eq!(body["is_favorite"], true);
    assert!(favorites.is_favorite(155).await.unwrap());
    assert!(storage.raw(FAVORITES_KEY).unwrap().contains("The Dark Knight"));

    let (_, body) = send(&app, "GET", "/movies/155").await;
    assert_eq!(body["is_favorite"], true);

    let (_, body) = send(&app, "POST", "/movies/155/favorite").await;
    assert_eq!(body["is_favorite"], false);
    assert_eq!(storage.raw(FAVORITES_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn toggle_skips_recommendations() {
    let tmdb = FakeTmdb::new(catalog());
    let recommendation_calls = tmdb.recommendation_calls.clone();
    let (app, favorites) = app_with(tmdb, Arc::new(MemoryStorage::new())).await;

    let (_, body) = send(&app, "POST", "/movies/268/favorite").await;
    assert_eq!(body["is_favorite"], true);
    assert_eq!(body["movie"]["data"]["details"]["title"], "Batman");
    assert_eq!(body["recommendations"]["status"], "idle");
    assert!(favorites.is_favorite(268).await.unwrap());
    assert_eq!(recommendation_calls.load(Ordering::SeqCst), 0);

    send(&app, "GET", "/movies/268").await;
    assert_eq!(recommendation_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_movie_cannot_be_favorited() {
    let storage = Arc::new(MemoryStorage::new());
    let (app, favorites) = app_with(FakeTmdb::new(catalog()), storage).await;
    let (_, body) = send(&app, "POST", "/movies/999/favorite").await;
    assert_eq!(body["movie"]["status"], "failed");
    assert_eq!(body["is_favorite"], false);
    assert!(favorites.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn favorites_empty_state() {
    let (app, _) = app_with(FakeTmdb::new(catalog()), Arc::new(MemoryStorage::new())).await;
    let (_, body) = send(&app, "GET", "/favorites").await;
    assert_eq!(body["message"], "No favorite movies found.");
    assert_eq!(body["favorites"]["data"]["cells"], serde_json::json!([]));
}

#[tokio::test]
async fn favorites_grid_is_padded_for_odd_counts() {
    let storage = Arc::new(MemoryStorage::new());
    let (app, favorites) = app_with(FakeTmdb::new(catalog()), storage).await;
    for m in catalog() {
        favorites.add(m).await.unwrap();
    }

    let (_, body) = send(&app, "GET", "/favorites").await;
    let cells = body["favorites"]["data"]["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 4);
    assert_eq!(cells[3], serde_json::json!({ "kind": "placeholder" }));
    assert!(body["message"].is_null());

    let (_, body) = send(&app, "DELETE", "/favorites/364").await;
    let cells = body["favorites"]["data"]["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 2);
    assert_eq!(
        card_titles(&body["favorites"]["data"]),
        vec!["Batman", "The Dark Knight"]
    );
}

#[tokio::test]
async fn removing_last_favorite_rewrites_empty_array() {
    let storage = Arc::new(MemoryStorage::with_value(
        FAVORITES_KEY,
        r#"[{"id":1,"title":"Only One","vote_average":5.0}]"#,
    ));
    let (app, _) = app_with(FakeTmdb::new(catalog()), storage.clone()).await;
    let (_, body) = send(&app, "DELETE", "/favorites/1").await;
    assert_eq!(body["message"], "No favorite movies found.");
    assert_eq!(storage.raw(FAVORITES_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn storage_failure_degrades_favorites_screen() {
    let storage = Arc::new(MemoryStorage::new());
    let (app, _) = app_with(FakeTmdb::new(catalog()), storage.clone()).await;
    storage.set_failing(true);

    let (status, body) = send(&app, "GET", "/favorites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorites"]["status"], "failed");

    let (_, body) = send(&app, "GET", "/movies/268").await;
    assert_eq!(body["movie"]["status"], "loaded");
    assert!(body["favorite_error"].as_str().unwrap().contains("Storage"));
}
