// src/app/types.rs
use serde::{Deserialize, Serialize};

use super::gateway::GatewayError;

// ---- records handed out by the gateway ----
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub top_cast: Vec<String>,
}

impl MovieRecord {
    /// First four characters of the release date, if there is one.
    pub fn release_year(&self) -> Option<&str> {
        let date = self.release_date.as_deref()?.trim();
        if date.is_empty() {
            return None;
        }
        match date.char_indices().nth(4) {
            Some((end, _)) => Some(&date[..end]),
            None => Some(date),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    pub comment: String,
    pub rating: i32,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Account,
    #[serde(default)]
    pub message: Option<String>,
    pub signed_in_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmittedMovie {
    pub id: i64,
    pub title: String,
    pub poster_url: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    pub name: String,
    pub key: String,
}

impl Trailer {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

// ---- requests sent to the backend ----
#[derive(Clone, Debug, Serialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewInput {
    pub user_id: i64,
    pub movie_id: i64,
    pub comment: String,
    pub rating: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieSubmission {
    pub title: String,
    pub poster_url: String,
    pub description: String,
}

// ---- filter controls ----
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Newest,
    Oldest,
    Highest,
    Alphabetical,
}

impl SortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Highest => "highest",
            Self::Alphabetical => "alphabetical",
        }
    }
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "highest" => Some(Self::Highest),
            "alphabetical" => Some(Self::Alphabetical),
            _ => None,
        }
    }
}

/// Page-level filter selection. Empty strings count as "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub year: Option<String>,
    pub rating: Option<String>,
    pub genre: Option<String>,
    pub sort: Option<SortKey>,
}

impl FilterSet {
    /// Build from `key=value` style pairs; unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut out = Self::default();
        for (k, v) in pairs {
            let v = v.trim();
            match k.trim() {
                "year" => out.year = non_empty(v),
                "rating" => out.rating = non_empty(v),
                "genre" => out.genre = non_empty(v),
                "sort" => out.sort = SortKey::from_str(v),
                _ => {}
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.year_value().is_none()
            && self.rating_value().is_none()
            && self.genre_value().is_none()
            && self.sort.is_none()
    }

    pub fn year_value(&self) -> Option<&str> {
        self.year.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn rating_value(&self) -> Option<&str> {
        self.rating.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn genre_value(&self) -> Option<&str> {
        self.genre.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn non_empty(v: &str) -> Option<String> {
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

// ---- fetch lifecycle ----
#[derive(Clone, Debug, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded(Vec<MovieRecord>),
    Failed(String),
}

impl FetchState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn movies(&self) -> &[MovieRecord] {
        match self {
            Self::Loaded(movies) => movies,
            _ => &[],
        }
    }
}

/// Which listing a query resolves to. Blank queries never reach search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchRequest {
    Popular { page: u32 },
    Search(String),
}

impl FetchRequest {
    pub fn for_query(query: &str) -> Self {
        let q = query.trim();
        if q.is_empty() {
            Self::Popular { page: 1 }
        } else {
            Self::Search(q.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub request: FetchRequest,
}

#[derive(Debug)]
pub struct FetchResponse {
    pub seq: u64,
    pub result: Result<Vec<MovieRecord>, GatewayError>,
}
