use crate::models::Movie;
use crate::tmdb::image_url;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    /// `vote_average` rounded to one decimal.
    pub rating: String,
}

impl MovieCard {
    pub fn from_movie(movie: &Movie, image_base: &str) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_url: image_url(image_base, movie.poster_path.as_deref()),
            rating: format_rating(movie.vote_average),
        }
    }
}

/// One decimal, ties rounded away from zero (7.25 -> "7.3").
pub fn format_rating(vote_average: f64) -> String {
    format!("{:.1}", (vote_average * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridCell {
    Card(MovieCard),
    /// Empty cell completing the last row. Carries no movie id.
    Placeholder,
}

impl GridCell {
    pub fn movie_id(&self) -> Option<i64> {
        match self {
            GridCell::Card(card) => Some(card.id),
            GridCell::Placeholder => None,
        }
    }

    pub fn key(&self, index: usize) -> String {
        match self {
            GridCell::Card(card) => card.id.to_string(),
            GridCell::Placeholder => format!("empty-{index}"),
        }
    }
}

/// Appends placeholders until the last row is full.
pub fn pad_to_columns(mut cells: Vec<GridCell>, columns: usize) -> Vec<GridCell> {
    if columns == 0 {
        return cells;
    }
    let remainder = cells.len() % columns;
    if remainder != 0 {
        cells.extend(std::iter::repeat(GridCell::Placeholder).take(columns - remainder));
    }
    cells
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Grid {
    pub columns: usize,
    pub cells: Vec<GridCell>,
}

impl Grid {
    /// One card per movie, in the given order.
    pub fn new(movies: &[Movie], columns: usize, image_base: &str) -> Self {
        let cells = movies
            .iter()
            .map(|m| GridCell::Card(MovieCard::from_movie(m, image_base)))
            .collect();
        Self { columns, cells }
    }

    pub fn padded(movies: &[Movie], columns: usize, image_base: &str) -> Self {
        let grid = Self::new(movies, columns, image_base);
        Self {
            columns,
            cells: pad_to_columns(grid.cells, columns),
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &MovieCard> {
        self.cells.iter().filter_map(|c| match c {
            GridCell::Card(card) => Some(card),
            GridCell::Placeholder => None,
        })
    }

    pub fn card_count(&self) -> usize {
        self.cards().count()
    }

    pub fn keys(&self) -> Vec<String> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| c.key(i))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(self.columns.max(1))
    }
}
