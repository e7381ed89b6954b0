//! Data structures and types for MovieStream
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalog**: movies and genres as served by the backend `/api`
//! - **Admin**: create/update bodies, dashboard stats, token validation
//! - **Watch state**: history entries kept in the local store

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Language assumed when the backend omits one
pub const DEFAULT_LANGUAGE: &str = "English";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

// =============================================================================
// Catalog Models
// =============================================================================

/// A movie as returned by `/api/movies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub synopsis: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    pub release_year: u16,
    /// Runtime in minutes
    pub runtime: u32,
    pub poster_url: String,
    pub video_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub subtitles: Vec<String>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(
        default = "chrono::Utc::now",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl Movie {
    /// Whether the movie is tagged with the given genre display name
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g == name)
    }

    /// Runtime formatted as "142 min"
    pub fn runtime_str(&self) -> String {
        format!("{} min", self.runtime)
    }

    /// Subtitle labels joined for display, "None" when there are none
    pub fn subtitles_str(&self) -> String {
        if self.subtitles.is_empty() {
            "None".to_string()
        } else {
            self.subtitles.join(", ")
        }
    }

    /// View count with thousands separators
    pub fn views_str(&self) -> String {
        format_count(self.view_count)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.release_year)
    }
}

/// A genre as returned by `/api/genres`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.slug)
    }
}

/// Derive a URL-safe slug from a genre name.
///
/// Lowercases, turns whitespace runs into `-`, then drops every character
/// outside `[a-z0-9-]`. Also used to normalize caller-supplied slugs.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let dashed = match Regex::new(r"\s+") {
        Ok(re) => re.replace_all(&lowered, "-").into_owned(),
        Err(_) => lowered,
    };
    dashed
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

// =============================================================================
// Admin Models
// =============================================================================

/// Body for `POST /api/admin/genres`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
    pub slug: String,
}

impl NewGenre {
    /// Build a genre body, deriving the slug from the name unless overridden.
    /// An override goes through the same normalization.
    pub fn new(name: impl Into<String>, slug_override: Option<&str>) -> Self {
        let name = name.into();
        let slug = match slug_override {
            Some(s) if !s.trim().is_empty() => slugify(s),
            _ => slugify(&name),
        };
        Self { name, slug }
    }
}

/// Body for `POST /api/admin/movies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFields {
    pub title: String,
    pub synopsis: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub release_year: u16,
    pub runtime: u32,
    pub poster_url: String,
    pub video_url: String,
    pub language: String,
    pub subtitles: Vec<String>,
}

impl From<&Movie> for MovieFields {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            synopsis: movie.synopsis.clone(),
            genres: movie.genres.clone(),
            cast: movie.cast.clone(),
            release_year: movie.release_year,
            runtime: movie.runtime,
            poster_url: movie.poster_url.clone(),
            video_url: movie.video_url.clone(),
            language: movie.language.clone(),
            subtitles: movie.subtitles.clone(),
        }
    }
}

/// Body for `PUT /api/admin/movies/{id}`; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<String>>,
}

impl MovieUpdate {
    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.synopsis.is_none()
            && self.genres.is_none()
            && self.cast.is_none()
            && self.release_year.is_none()
            && self.runtime.is_none()
            && self.poster_url.is_none()
            && self.video_url.is_none()
            && self.language.is_none()
            && self.subtitles.is_none()
    }
}

/// Movie summary inside the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMovie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Response of `GET /api/admin/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_movies: u64,
    pub total_views: u64,
    pub total_genres: u64,
    #[serde(default)]
    pub top_movies: Vec<TopMovie>,
}

/// Response of `POST /api/admin/validate-token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Watch State Models
// =============================================================================

/// One entry in the local watch history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub movie_id: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(movie_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            movie_id: movie_id.into(),
            timestamp,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a backend timestamp. Accepts RFC 3339 and naive ISO-8601 (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Split a comma separated list ("A, B ,C") into trimmed, non-empty items
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Format a count with thousands separators (12450 -> "12,450")
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format seconds as HH:MM:SS or MM:SS
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_json() -> &'static str {
        r#"{
            "id": "m-1",
            "title": "The Quantum Heist",
            "synopsis": "Scientists steal a quantum computer.",
            "genres": ["Action", "Sci-Fi"],
            "cast": ["Michael Chen"],
            "releaseYear": 2023,
            "runtime": 142,
            "posterUrl": "https://img/poster.jpg",
            "videoUrl": "http://video/heist.mp4",
            "viewCount": 12450,
            "createdAt": "2024-05-01T10:00:00.123456Z"
        }"#
    }

    // -------------------------------------------------------------------------
    // Movie Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_movie_deserialize_defaults() {
        let movie: Movie = serde_json::from_str(movie_json()).unwrap();
        assert_eq!(movie.release_year, 2023);
        assert_eq!(movie.language, "English");
        assert!(movie.subtitles.is_empty());
        assert_eq!(movie.view_count, 12450);
        assert!(movie.has_genre("Sci-Fi"));
        assert!(!movie.has_genre("Drama"));
    }

    #[test]
    fn test_movie_naive_timestamp() {
        let json = movie_json().replace("2024-05-01T10:00:00.123456Z", "2024-05-01T10:00:00");
        let movie: Movie = serde_json::from_str(&json).unwrap();
        assert_eq!(movie.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_movie_display_helpers() {
        let movie: Movie = serde_json::from_str(movie_json()).unwrap();
        assert_eq!(movie.to_string(), "The Quantum Heist (2023)");
        assert_eq!(movie.runtime_str(), "142 min");
        assert_eq!(movie.subtitles_str(), "None");
        assert_eq!(movie.views_str(), "12,450");
    }

    #[test]
    fn test_movie_serializes_camel_case() {
        let movie: Movie = serde_json::from_str(movie_json()).unwrap();
        let value = serde_json::to_value(&movie).unwrap();
        assert!(value.get("releaseYear").is_some());
        assert!(value.get("viewCount").is_some());
        assert!(value.get("release_year").is_none());
    }

    // -------------------------------------------------------------------------
    // Slug Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Action"), "action");
        assert_eq!(slugify("Sci-Fi"), "sci-fi");
        assert_eq!(slugify("Film   Noir"), "film-noir");
        assert_eq!(slugify("Rom/Com!"), "romcom");
        assert_eq!(slugify("Café Society"), "caf-society");
        assert_eq!(slugify("Weird ~ Name 2"), "weird--name-2");
    }

    #[test]
    fn test_new_genre_slug_override() {
        assert_eq!(NewGenre::new("Science Fiction", None).slug, "science-fiction");
        assert_eq!(NewGenre::new("Science Fiction", Some("SciFi")).slug, "scifi");
        assert_eq!(NewGenre::new("Horror", Some("  ")).slug, "horror");
    }

    // -------------------------------------------------------------------------
    // Admin Body Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_movie_update_skips_unset_fields() {
        let update = MovieUpdate {
            title: Some("New".into()),
            runtime: Some(90),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"title":"New","runtime":90}"#);
        assert!(!update.is_empty());
        assert!(MovieUpdate::default().is_empty());
    }

    #[test]
    fn test_admin_stats_parse() {
        let stats: AdminStats = serde_json::from_str(
            r#"{"totalMovies":30,"totalViews":120000,"totalGenres":10,
                "topMovies":[{"id":"a","title":"A","viewCount":9000,"posterUrl":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(stats.total_movies, 30);
        assert_eq!(stats.top_movies[0].view_count, 9000);
    }

    // -------------------------------------------------------------------------
    // Helper Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_history_entry_wire_format() {
        let entry = HistoryEntry::new("m-1", parse_timestamp("2024-01-02T03:04:05.000Z").unwrap());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["movieId"], "m-1");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-01-02T03:04:05"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("A, B ,C"), vec!["A", "B", "C"]);
        assert_eq!(parse_list(" , "), Vec::<String>::new());
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(65.9), "01:05");
        assert_eq!(format_clock(3725.0), "01:02:05");
        assert_eq!(format_clock(f64::NAN), "00:00");
    }
}
