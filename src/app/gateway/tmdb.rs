//! TMDb (The Movie Database) v3 client: search, popular listing, credits
//! and videos. Every collection the provider returns sits under a
//! `results` field that is validated here before anything reaches the engine.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::{network_error, read_json, require, require_array};
use super::GatewayError;
use crate::app::types::{MovieRecord, Trailer};

pub const BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const POSTER_SIZE: &str = "w500";
pub const TOP_CAST: usize = 3;

pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
}

impl TmdbClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, language: String) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key,
            language,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get(&self, path: &str, extra_params: &[(&str, &str)]) -> Result<Value, GatewayError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GatewayError::InvalidInput(
                "no TMDb API key configured (tmdb_api_key)".into(),
            ));
        };

        let url = format!("{}{path}", self.base_url);
        let mut params: Vec<(&str, &str)> =
            vec![("api_key", api_key), ("language", self.language.as_str())];
        params.extend_from_slice(extra_params);

        debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| network_error(path, &e))?;
        read_json(resp, path).await
    }

    pub async fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>, GatewayError> {
        let body = self.get("/search/movie", &[("query", query)]).await?;
        parse_listing(&body, "/search/movie")
    }

    pub async fn popular_movies(&self, page: u32) -> Result<Vec<MovieRecord>, GatewayError> {
        let page = page.max(1).to_string();
        let body = self.get("/movie/popular", &[("page", page.as_str())]).await?;
        parse_listing(&body, "/movie/popular")
    }

    pub async fn top_cast(&self, id: i64) -> Result<Vec<String>, GatewayError> {
        let path = format!("/movie/{id}/credits");
        let body = self.get(&path, &[]).await?;
        parse_cast(&body, &path)
    }

    pub async fn trailers(&self, id: i64) -> Result<Vec<Trailer>, GatewayError> {
        let path = format!("/movie/{id}/videos");
        let body = self.get(&path, &[]).await?;
        parse_trailers(&body, &path)
    }
}

/// Full image URL for a TMDb poster path like `/abc123.jpg`.
pub fn poster_url(path: &str) -> String {
    format!("{IMAGE_BASE_URL}/{POSTER_SIZE}{path}")
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbMovieItem {
    id: i64,
    #[serde(alias = "name")]
    title: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn parse_movie(value: &Value) -> Option<MovieRecord> {
    let item: TmdbMovieItem = serde_json::from_value(value.clone()).ok()?;
    let title = blank_to_none(item.title)?;
    Some(MovieRecord {
        id: item.id,
        title,
        release_date: blank_to_none(item.release_date),
        poster_path: blank_to_none(item.poster_path),
        vote_average: item.vote_average.filter(|v| v.is_finite()),
        overview: blank_to_none(item.overview),
        top_cast: Vec::new(),
    })
}

/// Validate a `{"results": [...]}` page. A missing `results` is a shape error;
/// individual malformed entries are skipped with a warning.
pub(crate) fn parse_listing(value: &Value, context: &str) -> Result<Vec<MovieRecord>, GatewayError> {
    let results = require_array(value, "results", context)?;
    let mut out = Vec::with_capacity(results.len());
    let mut skipped = 0usize;
    for entry in results {
        match parse_movie(entry) {
            Some(movie) => out.push(movie),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{context}: skipped {skipped} result(s) without id/title");
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct CastEntry {
    name: Option<String>,
    #[serde(default)]
    order: Option<i64>,
}

pub(crate) fn parse_cast(value: &Value, context: &str) -> Result<Vec<String>, GatewayError> {
    let cast = require_array(value, "cast", context)?;
    let mut entries: Vec<(i64, String)> = cast
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let entry: CastEntry = serde_json::from_value(v.clone()).ok()?;
            let name = blank_to_none(entry.name)?;
            Some((entry.order.unwrap_or(i as i64), name))
        })
        .collect();
    entries.sort_by_key(|(order, _)| *order);
    Ok(entries
        .into_iter()
        .map(|(_, name)| name)
        .take(TOP_CAST)
        .collect())
}

pub(crate) fn parse_trailers(value: &Value, context: &str) -> Result<Vec<Trailer>, GatewayError> {
    let results = require_array(value, "results", context)?;
    Ok(results
        .iter()
        .filter(|v| v.get("site").and_then(Value::as_str) == Some("YouTube"))
        .filter(|v| v.get("type").and_then(Value::as_str) == Some("Trailer"))
        .filter_map(|v| {
            let key = require(v, "key", context).ok()?.as_str()?.to_string();
            let name = v
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Trailer")
                .to_string();
            Some(Trailer { name, key })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_keeps_provider_order_and_normalizes_blanks() {
        let body = json!({
            "page": 1,
            "results": [
                {"id": 603, "title": "The Matrix", "release_date": "1999-03-30",
                 "poster_path": "/m.jpg", "vote_average": 8.2},
                {"id": 604, "title": "The Matrix Reloaded", "release_date": "",
                 "poster_path": null, "vote_average": 7.0}
            ]
        });
        let movies = parse_listing(&body, "/movie/popular").unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 603);
        assert_eq!(movies[0].release_year(), Some("1999"));
        assert_eq!(movies[1].release_date, None);
        assert_eq!(movies[1].poster_path, None);
    }

    #[test]
    fn listing_without_results_is_shape_error() {
        let body = json!({"status_code": 7, "success": false});
        let err = parse_listing(&body, "/search/movie").unwrap_err();
        assert_eq!(
            err,
            GatewayError::InvalidResponseShape {
                context: "/search/movie".into(),
                missing: "results".into()
            }
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = json!({"results": [{"id": 1}, "junk", {"id": 2, "title": "Up"}]});
        let movies = parse_listing(&body, "/search/movie").unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Up");
    }

    #[test]
    fn cast_is_billing_order_capped_at_three() {
        let body = json!({"id": 1, "cast": [
            {"name": "D", "order": 3},
            {"name": "A", "order": 0},
            {"name": "C", "order": 2},
            {"name": "B", "order": 1}
        ]});
        assert_eq!(parse_cast(&body, "credits").unwrap(), vec!["A", "B", "C"]);
        assert!(parse_cast(&json!({"id": 1}), "credits").is_err());
    }

    #[test]
    fn only_youtube_trailers_survive() {
        let body = json!({"results": [
            {"site": "YouTube", "type": "Teaser", "key": "t1", "name": "Teaser"},
            {"site": "Vimeo", "type": "Trailer", "key": "v1", "name": "Vimeo cut"},
            {"site": "YouTube", "type": "Trailer", "key": "abc", "name": "Official Trailer"}
        ]});
        let trailers = parse_trailers(&body, "videos").unwrap();
        assert_eq!(trailers.len(), 1);
        assert_eq!(trailers[0].watch_url(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn poster_url_uses_w500() {
        assert_eq!(poster_url("/x.jpg"), "https://image.tmdb.org/t/p/w500/x.jpg");
    }
}
