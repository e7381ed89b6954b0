//! Search request composition
//!
//! A search needs non-empty text. Genre and year only narrow an existing
//! text search; on their own they never trigger a request.

use crate::models::Movie;

/// Shown when there is no search text
pub const PROMPT_MESSAGE: &str = "Enter a search term to find movies.";

/// Shown when a search came back empty
pub const NO_RESULTS_MESSAGE: &str = "No movies found matching your search.";

/// A validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub genre: Option<String>,
    pub year: Option<u16>,
}

impl SearchQuery {
    /// Build a request, or `None` when the trimmed text is empty
    pub fn compose(query: &str, genre: Option<&str>, year: Option<u16>) -> Option<Self> {
        let q = query.trim();
        if q.is_empty() {
            return None;
        }

        Some(Self {
            q: q.to_string(),
            genre: genre
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from),
            year,
        })
    }

    /// URL query string (`q=...&genre=...&year=...`)
    pub fn to_query_string(&self) -> String {
        let mut params = format!("q={}", urlencoding::encode(&self.q));
        if let Some(ref genre) = self.genre {
            params.push_str(&format!("&genre={}", urlencoding::encode(genre)));
        }
        if let Some(year) = self.year {
            params.push_str(&format!("&year={}", year));
        }
        params
    }
}

/// What the results area shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    /// No text yet
    #[default]
    Prompt,
    Loading,
    Results(Vec<Movie>),
    /// Request succeeded with zero matches
    NoResults,
    /// Request failed; shown like an empty result
    Failed(String),
}

impl SearchState {
    /// State for a completed request
    pub fn from_results(movies: Vec<Movie>) -> Self {
        if movies.is_empty() {
            SearchState::NoResults
        } else {
            SearchState::Results(movies)
        }
    }

    /// Message for the non-result states
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchState::Prompt => Some(PROMPT_MESSAGE),
            SearchState::NoResults | SearchState::Failed(_) => Some(NO_RESULTS_MESSAGE),
            SearchState::Loading | SearchState::Results(_) => None,
        }
    }

    pub fn movies(&self) -> &[Movie] {
        match self {
            SearchState::Results(movies) => movies,
            _ => &[],
        }
    }
}

/// Typed search text plus filters
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub query: String,
    pub genre: Option<String>,
    pub year: Option<u16>,
    pub state: SearchState,
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn compose(&self) -> Option<SearchQuery> {
        SearchQuery::compose(&self.query, self.genre.as_deref(), self.year)
    }

    /// Whether the typed text would produce a request
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Submit the form. Returns the request to issue, or `None` after
    /// switching to the prompt state.
    pub fn submit(&mut self) -> Option<SearchQuery> {
        match self.compose() {
            Some(query) => {
                self.state = SearchState::Loading;
                Some(query)
            }
            None => {
                self.state = SearchState::Prompt;
                None
            }
        }
    }

    /// Change the genre filter; re-issues the search when text is present
    pub fn set_genre(&mut self, genre: Option<String>) -> Option<SearchQuery> {
        self.genre = genre.filter(|g| !g.trim().is_empty());
        self.reissue()
    }

    /// Change the year filter; re-issues the search when text is present
    pub fn set_year(&mut self, year: Option<u16>) -> Option<SearchQuery> {
        self.year = year;
        self.reissue()
    }

    fn reissue(&mut self) -> Option<SearchQuery> {
        let query = self.compose()?;
        self.state = SearchState::Loading;
        Some(query)
    }

    /// Apply a finished request
    pub fn apply_results(&mut self, movies: Vec<Movie>) {
        self.state = SearchState::from_results(movies);
    }

    /// Apply a failed request
    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.state = SearchState::Failed(message.into());
    }
}
