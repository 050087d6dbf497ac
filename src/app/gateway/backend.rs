// src/app/gateway/backend.rs
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::http::{network_error, optional_str, read_json, require, require_array};
use super::GatewayError;
use crate::app::types::{
    Account, Credentials, MovieRecord, MovieSubmission, RegisterInput, Review, ReviewInput,
    Session, SubmittedMovie,
};

/// First-party backend: accounts, user-submitted movies and reviews.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| network_error(path, &e))?;
        read_json(resp, path).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        debug!("POST {url}");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(path, &e))?;
        read_json(resp, path).await
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<Account, GatewayError> {
        validate_registration(input)?;
        let body = self.post("/users", input).await?;
        let account = parse_account(&body, "/users")?;
        info!("registered account {} ({})", account.id, account.username);
        Ok(account)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, GatewayError> {
        validate_credentials(credentials)?;
        let body = self.post("/login", credentials).await?;
        let session = parse_session(&body)?;
        info!("signed in as {}", session.user.username);
        Ok(session)
    }

    pub async fn movie_detail(&self, id: i64) -> Result<(MovieRecord, Vec<Review>), GatewayError> {
        let path = format!("/api/movies/{id}");
        let body = self.get(&path).await?;
        parse_movie_detail(&body, &path)
    }

    pub async fn user_reviews(&self, user_id: i64) -> Result<Vec<Review>, GatewayError> {
        let path = format!("/users/{user_id}/reviews");
        let body = self.get(&path).await?;
        let list = body.as_array().ok_or_else(|| {
            warn!("{path}: expected a list of reviews");
            GatewayError::InvalidResponseShape {
                context: path.clone(),
                missing: "reviews".into(),
            }
        })?;
        Ok(parse_reviews(list, &path))
    }

    pub async fn submit_review(&self, input: &ReviewInput) -> Result<Review, GatewayError> {
        validate_review(input)?;
        let body = self.post("/reviews", input).await?;
        parse_review(&body).ok_or_else(|| GatewayError::InvalidResponseShape {
            context: "/reviews".into(),
            missing: "id".into(),
        })
    }

    pub async fn submit_movie(
        &self,
        submission: &MovieSubmission,
    ) -> Result<SubmittedMovie, GatewayError> {
        validate_submission(submission)?;
        let body = self.post("/movies", submission).await?;
        serde_json::from_value::<SubmittedMovie>(body).map_err(|e| {
            warn!("/movies: unexpected body: {e}");
            GatewayError::InvalidResponseShape {
                context: "/movies".into(),
                missing: "id".into(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Client-side checks, mirroring the backend's required fields
// ---------------------------------------------------------------------------

fn required(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub fn validate_registration(input: &RegisterInput) -> Result<(), GatewayError> {
    required("username", &input.username)?;
    required("email", &input.email)?;
    required("password", &input.password)?;
    if !input.email.contains('@') {
        return Err(GatewayError::InvalidInput("email looks invalid".into()));
    }
    Ok(())
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), GatewayError> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(GatewayError::InvalidInput(
            "Email and password are required".into(),
        ));
    }
    Ok(())
}

pub fn validate_review(input: &ReviewInput) -> Result<(), GatewayError> {
    if input.user_id <= 0 {
        return Err(GatewayError::InvalidInput("user_id is required".into()));
    }
    if input.movie_id <= 0 {
        return Err(GatewayError::InvalidInput("movie_id is required".into()));
    }
    required("comment", &input.comment)?;
    if !(1..=5).contains(&input.rating) {
        return Err(GatewayError::InvalidInput(
            "rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

pub fn validate_submission(submission: &MovieSubmission) -> Result<(), GatewayError> {
    required("title", &submission.title)?;
    required("poster_url", &submission.poster_url)?;
    required("description", &submission.description)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn parse_account(value: &Value, context: &str) -> Result<Account, GatewayError> {
    let id = require(value, "id", context)?
        .as_i64()
        .ok_or_else(|| GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: "id".into(),
        })?;
    let username = optional_str(value, "username").ok_or_else(|| {
        GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: "username".into(),
        }
    })?;
    let email = optional_str(value, "email").ok_or_else(|| GatewayError::InvalidResponseShape {
        context: context.to_string(),
        missing: "email".into(),
    })?;
    Ok(Account {
        id,
        username,
        email,
    })
}

pub(crate) fn parse_session(value: &Value) -> Result<Session, GatewayError> {
    let user = require(value, "user", "/login")?;
    Ok(Session {
        user: parse_account(user, "/login user")?,
        message: optional_str(value, "message"),
        signed_in_at: Utc::now(),
    })
}

pub(crate) fn parse_review(value: &Value) -> Option<Review> {
    let review: Review = serde_json::from_value(value.clone()).ok()?;
    Some(review)
}

fn parse_reviews(list: &[Value], context: &str) -> Vec<Review> {
    let reviews: Vec<Review> = list.iter().filter_map(parse_review).collect();
    if reviews.len() < list.len() {
        warn!(
            "{context}: skipped {} malformed review(s)",
            list.len() - reviews.len()
        );
    }
    reviews
}

/// The backend builds poster URLs by string concatenation, so a movie with no
/// poster comes back ending in `None`.
fn clean_poster_url(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.ends_with("None") && !u.ends_with("null"))
}

pub(crate) fn parse_movie_detail(
    value: &Value,
    context: &str,
) -> Result<(MovieRecord, Vec<Review>), GatewayError> {
    let movie = require(value, "movie", context)?;
    let reviews = require_array(value, "reviews", context)?;

    let id = movie
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: "movie.id".into(),
        })?;
    let title = optional_str(movie, "title").ok_or_else(|| {
        warn!("{context}: movie has no title");
        GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: "movie.title".into(),
        }
    })?;

    let record = MovieRecord {
        id,
        title,
        release_date: optional_str(movie, "year"),
        poster_path: clean_poster_url(optional_str(movie, "poster_url")),
        vote_average: None,
        overview: optional_str(movie, "description"),
        top_cast: Vec::new(),
    };
    Ok((record, parse_reviews(reviews, context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_parses_movie_and_reviews() {
        let body = json!({
            "movie": {"id": 550, "title": "Fight Club",
                      "poster_url": "https://image.tmdb.org/t/p/w500/f.jpg",
                      "description": "An insomniac...", "year": "1999"},
            "reviews": [
                {"id": 1, "username": "sam", "comment": "Great", "rating": 5},
                {"id": 2, "username": "Unknown", "comment": "Meh", "rating": 2}
            ]
        });
        let (movie, reviews) = parse_movie_detail(&body, "/api/movies/550").unwrap();
        assert_eq!(movie.id, 550);
        assert_eq!(movie.release_year(), Some("1999"));
        assert_eq!(movie.overview.as_deref(), Some("An insomniac..."));
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].username.as_deref(), Some("sam"));
    }

    #[test]
    fn detail_without_reviews_field_is_shape_error() {
        let body = json!({"movie": {"id": 1, "title": "x"}});
        let err = parse_movie_detail(&body, "/api/movies/1").unwrap_err();
        assert!(matches!(
            err,
            GatewayError::InvalidResponseShape { ref missing, .. } if missing == "reviews"
        ));
    }

    #[test]
    fn placeholder_poster_url_is_dropped() {
        let body = json!({
            "movie": {"id": 9, "title": "No Poster",
                      "poster_url": "https://image.tmdb.org/t/p/w500None", "year": ""},
            "reviews": []
        });
        let (movie, _) = parse_movie_detail(&body, "/api/movies/9").unwrap();
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.release_date, None);
    }

    #[test]
    fn login_body_becomes_session_without_password() {
        let body = json!({
            "message": "Welcome back, sam!",
            "user": {"id": 3, "username": "sam", "email": "sam@example.com", "password": "pw"}
        });
        let session = parse_session(&body).unwrap();
        assert_eq!(session.user.id, 3);
        assert_eq!(session.message.as_deref(), Some("Welcome back, sam!"));
        let saved = serde_json::to_string(&session).unwrap();
        assert!(!saved.contains("\"pw\""));
    }

    #[test]
    fn review_rules_match_backend() {
        let mut input = ReviewInput {
            user_id: 1,
            movie_id: 550,
            comment: "Loved it".into(),
            rating: 5,
        };
        assert!(validate_review(&input).is_ok());
        input.rating = 6;
        assert!(validate_review(&input).is_err());
        input.rating = 3;
        input.comment = "  ".into();
        assert_eq!(
            validate_review(&input).unwrap_err(),
            GatewayError::InvalidInput("comment is required".into())
        );
    }

    #[test]
    fn registration_and_submission_need_every_field() {
        let reg = RegisterInput {
            username: "sam".into(),
            email: "".into(),
            password: "pw".into(),
        };
        assert_eq!(
            validate_registration(&reg).unwrap_err(),
            GatewayError::InvalidInput("email is required".into())
        );
        let sub = MovieSubmission {
            title: "Home Movie".into(),
            poster_url: "https://example.com/p.jpg".into(),
            description: "".into(),
        };
        assert!(validate_submission(&sub).is_err());
        assert!(validate_credentials(&Credentials {
            email: "a@b.c".into(),
            password: "".into()
        })
        .is_err());
    }
}
