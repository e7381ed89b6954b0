//! Home page composition
//!
//! Turns one catalog page plus the genre list into the featured carousel
//! and the rows shown below it.

use serde::Serialize;

use crate::models::{Genre, Movie};
use crate::playback::carousel::select_featured;

/// Movies requested for the home page
pub const HOME_MOVIE_LIMIT: u32 = 30;

/// Length of the ranked rows
pub const RANKED_ROW_LEN: usize = 10;

/// Only the first genres get a row
pub const GENRE_ROW_COUNT: usize = 6;

pub const TRENDING_TITLE: &str = "Trending Now";
pub const RECENT_TITLE: &str = "Recently Added";

/// A titled horizontal row of movies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRow {
    pub title: String,
    pub movies: Vec<Movie>,
}

/// Everything the home page shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeFeed {
    pub featured: Vec<Movie>,
    pub rows: Vec<MovieRow>,
}

impl HomeFeed {
    /// Compose the feed. Rows with no movies are left out.
    pub fn compose(movies: &[Movie], genres: &[Genre]) -> Self {
        let mut rows = Vec::new();

        let mut trending = select_ranked(movies, |a, b| b.view_count.cmp(&a.view_count));
        trending.truncate(RANKED_ROW_LEN);
        push_row(&mut rows, TRENDING_TITLE, trending);

        for genre in genres.iter().take(GENRE_ROW_COUNT) {
            let matching: Vec<Movie> = movies
                .iter()
                .filter(|m| m.has_genre(&genre.name))
                .cloned()
                .collect();
            push_row(&mut rows, &genre.name, matching);
        }

        let mut recent = select_ranked(movies, |a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RANKED_ROW_LEN);
        push_row(&mut rows, RECENT_TITLE, recent);

        Self {
            featured: select_featured(movies),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.featured.is_empty() && self.rows.is_empty()
    }

    /// Look a movie up across featured and rows
    pub fn find_movie(&self, id: &str) -> Option<&Movie> {
        self.featured
            .iter()
            .chain(self.rows.iter().flat_map(|r| r.movies.iter()))
            .find(|m| m.id == id)
    }
}

fn select_ranked<F>(movies: &[Movie], order: F) -> Vec<Movie>
where
    F: FnMut(&Movie, &Movie) -> std::cmp::Ordering,
{
    let mut ranked = movies.to_vec();
    ranked.sort_by(order);
    ranked
}

fn push_row(rows: &mut Vec<MovieRow>, title: &str, movies: Vec<Movie>) {
    if !movies.is_empty() {
        rows.push(MovieRow {
            title: title.to_string(),
            movies,
        });
    }
}
