// src/app/view.rs
use super::filters;
use super::gateway::{tmdb, GatewayError};
use super::types::{FetchState, FilterSet, MovieRecord};

/// Below this width the grid collapses to a single column.
pub const MOBILE_BREAKPOINT_PX: f32 = 768.0;
pub const DESKTOP_COLUMNS: usize = 3;
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/300x450?text=No+Image";

#[derive(Clone, Debug, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title_line: String,
    pub poster_url: String,
    pub rating_label: Option<String>,
    pub detail_path: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ListView {
    Idle,
    Loading,
    Failed(String),
    NoResults,
    /// The listing came back unusable; carries the diagnostic.
    Malformed(String),
    Cards(Vec<MovieCard>),
}

/// "Title (YYYY)", or just the title when the year is unknown.
pub fn title_line(title: &str, year: Option<&str>) -> String {
    match year {
        Some(y) => format!("{title} ({y})"),
        None => title.to_string(),
    }
}

/// Backend movies carry a full URL, provider records only a path.
pub fn resolve_poster(path: Option<&str>) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.starts_with("http://") || p.starts_with("https://") => p.to_string(),
        Some(p) => tmdb::poster_url(p),
        None => PLACEHOLDER_POSTER.to_string(),
    }
}

pub fn card_for(movie: &MovieRecord) -> MovieCard {
    MovieCard {
        id: movie.id,
        title_line: title_line(&movie.title, movie.release_year()),
        poster_url: resolve_poster(movie.poster_path.as_deref()),
        rating_label: movie.vote_average.map(|v| format!("{v:.1}/10")),
        detail_path: format!("/spotlight/{}", movie.id),
    }
}

pub fn listing_heading(query: &str) -> String {
    let q = query.trim();
    if q.is_empty() {
        "Popular Movies".to_string()
    } else {
        format!("Results for \"{q}\"")
    }
}

pub fn compose_list(
    state: &FetchState,
    filter_set: &FilterSet,
    diagnostic: Option<&GatewayError>,
) -> ListView {
    match state {
        FetchState::Idle => ListView::Idle,
        FetchState::Loading => ListView::Loading,
        FetchState::Failed(reason) => ListView::Failed(reason.clone()),
        FetchState::Loaded(movies) if movies.is_empty() && diagnostic.is_some() => {
            ListView::Malformed(diagnostic.map(ToString::to_string).unwrap_or_default())
        }
        FetchState::Loaded(movies) => {
            let idx = filters::filtered_indices(movies, filter_set);
            if idx.is_empty() {
                ListView::NoResults
            } else {
                ListView::Cards(idx.into_iter().map(|i| card_for(&movies[i])).collect())
            }
        }
    }
}

pub fn grid_columns(viewport_width: f32) -> usize {
    if viewport_width < MOBILE_BREAKPOINT_PX {
        1
    } else {
        DESKTOP_COLUMNS
    }
}
