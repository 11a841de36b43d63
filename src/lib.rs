pub mod app;
pub mod config;
pub mod error;
pub mod favorites;
pub mod grid;
pub mod models;
pub mod screens;
pub mod storage;
pub mod tmdb;

pub use error::{Error, Result};
