use crate::error::{Error, Result};
use crate::models::Movie;
use crate::storage::KeyValueStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Storage key holding the JSON array of favorited movies.
pub const FAVORITES_KEY: &str = "favoriteMovies";

/// The user's favorites collection, persisted as one JSON array under
/// [`FAVORITES_KEY`].
///
/// Every operation reads the stored collection, and every mutation writes the
/// full collection back before returning. Operations are serialized through a
/// single lock so rapid toggles cannot lose each other's writes. At most one
/// record per movie id is kept.
pub struct FavoritesStore {
    storage: Mutex<Option<Arc<dyn KeyValueStorage>>>,
}

impl FavoritesStore {
    /// Opens the store and checks that the stored value, if any, is readable.
    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        let existing = load(storage.as_ref()).await?;
        info!("Opened favorites store with {} movies", existing.len());
        Ok(Self {
            storage: Mutex::new(Some(storage)),
        })
    }

    /// Detaches the backing storage; later operations fail with a storage error.
    pub async fn close(&self) {
        if self.storage.lock().await.take().is_some() {
            info!("Closed favorites store");
        }
    }

    pub async fn is_favorite(&self, id: i64) -> Result<bool> {
        let guard = self.storage.lock().await;
        let storage = guard.as_deref().ok_or_else(closed)?;
        Ok(load(storage).await?.iter().any(|m| m.id == id))
    }

    /// Appends `movie` unless a record with its id exists. Returns whether it
    /// was inserted.
    pub async fn add(&self, movie: Movie) -> Result<bool> {
        let guard = self.storage.lock().await;
        let storage = guard.as_deref().ok_or_else(closed)?;
        let mut movies = load(storage).await?;
        if movies.iter().any(|m| m.id == movie.id) {
            debug!(movie_id = movie.id, "Already a favorite");
            return Ok(false);
        }
        info!("Adding '{}' ({}) to favorites", movie.title, movie.id);
        movies.push(movie);
        persist(storage, &movies).await?;
        Ok(true)
    }

    /// Removes the record with `id` and rewrites the collection. Returns
    /// whether a record was removed.
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let guard = self.storage.lock().await;
        let storage = guard.as_deref().ok_or_else(closed)?;
        let mut movies = load(storage).await?;
        let before = movies.len();
        movies.retain(|m| m.id != id);
        let removed = movies.len() != before;
        if removed {
            info!("Removing movie {} from favorites", id);
        }
        persist(storage, &movies).await?;
        Ok(removed)
    }

    /// Adds the movie if absent, removes it otherwise. Returns the new status.
    pub async fn toggle(&self, movie: Movie) -> Result<bool> {
        let guard = self.storage.lock().await;
        let storage = guard.as_deref().ok_or_else(closed)?;
        let mut movies = load(storage).await?;
        let now_favorite = if movies.iter().any(|m| m.id == movie.id) {
            movies.retain(|m| m.id != movie.id);
            false
        } else {
            movies.push(movie);
            true
        };
        persist(storage, &movies).await?;
        Ok(now_favorite)
    }

    pub async fn list(&self) -> Result<Vec<Movie>> {
        let guard = self.storage.lock().await;
        let storage = guard.as_deref().ok_or_else(closed)?;
        load(storage).await
    }
}

fn closed() -> Error {
    Error::Storage("favorites store is closed".to_string())
}

async fn load(storage: &dyn KeyValueStorage) -> Result<Vec<Movie>> {
    match storage.get(FAVORITES_KEY).await? {
        None => Ok(Vec::new()),
        Some(blob) => serde_json::from_str(&blob).map_err(|e| {
            Error::Storage(format!("stored favorites are not a movie array: {e}"))
        }),
    }
}

async fn persist(storage: &dyn KeyValueStorage, movies: &[Movie]) -> Result<()> {
    let blob = serde_json::to_string(movies)
        .map_err(|e| Error::Storage(format!("failed to serialize favorites: {e}")))?;
    storage.set(FAVORITES_KEY, &blob).await?;
    debug!(count = movies.len(), "Persisted favorites");
    Ok(())
}
