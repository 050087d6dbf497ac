// src/app/gateway/mod.rs
pub mod backend;
pub(crate) mod http;
pub mod tmdb;

use async_trait::async_trait;
use tracing::warn;

use crate::app::types::{
    Account, Credentials, FetchRequest, MovieRecord, MovieSubmission, RegisterInput, Review,
    ReviewInput, Session, SubmittedMovie, Trailer,
};
use crate::config::AppConfig;

pub use backend::BackendClient;
pub use tmdb::TmdbClient;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// No response: connect failure, timeout, or a body that never arrived.
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("unexpected response from {context}: missing `{missing}`")]
    InvalidResponseShape { context: String, missing: String },

    #[error("request rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    RemoteRejected { status: u16, message: Option<String> },

    /// Rejected locally before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The task running the call panicked or was cancelled.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl GatewayError {
    pub const fn is_shape_error(&self) -> bool {
        matches!(self, Self::InvalidResponseShape { .. })
    }
}

/// The listing half of the gateway, which is all the fetch controller needs.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>, GatewayError>;

    async fn list_popular_movies(&self, page: u32) -> Result<Vec<MovieRecord>, GatewayError>;

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<MovieRecord>, GatewayError> {
        match request {
            FetchRequest::Popular { page } => self.list_popular_movies(*page).await,
            FetchRequest::Search(query) => self.search_movies(query).await,
        }
    }
}

#[async_trait]
pub trait MovieGateway: MovieSource {
    async fn get_movie_detail(&self, id: i64) -> Result<(MovieRecord, Vec<Review>), GatewayError>;

    async fn submit_review(&self, input: &ReviewInput) -> Result<Review, GatewayError>;

    async fn register_account(&self, input: &RegisterInput) -> Result<Account, GatewayError>;

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, GatewayError>;

    async fn list_user_reviews(&self, user_id: i64) -> Result<Vec<Review>, GatewayError>;

    async fn submit_movie(&self, submission: &MovieSubmission)
        -> Result<SubmittedMovie, GatewayError>;

    async fn top_cast(&self, id: i64) -> Result<Vec<String>, GatewayError>;

    async fn trailers(&self, id: i64) -> Result<Vec<Trailer>, GatewayError>;
}

/// Production gateway: TMDb for listings and metadata, the backend for
/// accounts, reviews and movie detail pages.
pub struct HttpGateway {
    tmdb: TmdbClient,
    backend: BackendClient,
}

impl HttpGateway {
    pub fn new(tmdb: TmdbClient, backend: BackendClient) -> Self {
        Self { tmdb, backend }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, GatewayError> {
        let client = http::build_client(cfg.request_timeout())?;
        if cfg.tmdb_api_key.is_none() {
            warn!("tmdb_api_key is not set; listings and credits will fail");
        }
        Ok(Self::new(
            TmdbClient::new(
                client.clone(),
                cfg.tmdb_api_key.clone(),
                cfg.tmdb_language.clone(),
            ),
            BackendClient::new(client, cfg.backend_base_url.clone()),
        ))
    }
}

#[async_trait]
impl MovieSource for HttpGateway {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>, GatewayError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_popular_movies(1).await;
        }
        self.tmdb.search_movies(query).await
    }

    async fn list_popular_movies(&self, page: u32) -> Result<Vec<MovieRecord>, GatewayError> {
        self.tmdb.popular_movies(page).await
    }
}

#[async_trait]
impl MovieGateway for HttpGateway {
    async fn get_movie_detail(&self, id: i64) -> Result<(MovieRecord, Vec<Review>), GatewayError> {
        let (mut movie, reviews) = self.backend.movie_detail(id).await?;
        if self.tmdb.has_api_key() {
            // cast is a nice-to-have on the detail page; the page still renders without it
            match self.tmdb.top_cast(id).await {
                Ok(cast) => movie.top_cast = cast,
                Err(err) => warn!("cast lookup for movie {id} failed: {err}"),
            }
        }
        Ok((movie, reviews))
    }

    async fn submit_review(&self, input: &ReviewInput) -> Result<Review, GatewayError> {
        self.backend.submit_review(input).await
    }

    async fn register_account(&self, input: &RegisterInput) -> Result<Account, GatewayError> {
        self.backend.register(input).await
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, GatewayError> {
        self.backend.login(credentials).await
    }

    async fn list_user_reviews(&self, user_id: i64) -> Result<Vec<Review>, GatewayError> {
        self.backend.user_reviews(user_id).await
    }

    async fn submit_movie(
        &self,
        submission: &MovieSubmission,
    ) -> Result<SubmittedMovie, GatewayError> {
        self.backend.submit_movie(submission).await
    }

    async fn top_cast(&self, id: i64) -> Result<Vec<String>, GatewayError> {
        self.tmdb.top_cast(id).await
    }

    async fn trailers(&self, id: i64) -> Result<Vec<Trailer>, GatewayError> {
        self.tmdb.trailers(id).await
    }
}
