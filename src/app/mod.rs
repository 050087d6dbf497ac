// src/app/mod.rs: page state, listing fetch and signed-in session

pub mod controller;
pub mod detail;
pub mod filters;
pub mod gateway;
pub mod session;
pub mod types;
pub mod view;

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::controller::{FetchController, FetchDriver};
use crate::app::detail::DetailView;
use crate::app::gateway::{GatewayError, HttpGateway, MovieGateway};
use crate::app::session::{SessionError, SessionStore};
use crate::app::types::{
    Account, Credentials, FetchState, FilterSet, MovieRecord, MovieSubmission, RegisterInput,
    Review, ReviewInput, Session, SubmittedMovie,
};
use crate::app::view::ListView;
use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("sign in first")]
    SignedOut,
}

pub struct ReelTalkApp<G: MovieGateway + ?Sized + 'static> {
    gateway: Arc<G>,
    listing: FetchDriver<G>,
    filters: FilterSet,
    session: SessionStore,
}

impl ReelTalkApp<HttpGateway> {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, GatewayError> {
        let gateway = Arc::new(HttpGateway::from_config(cfg)?);
        Ok(Self::new(gateway, SessionStore::open(cfg.session_path())))
    }
}

impl<G: MovieGateway + ?Sized + 'static> ReelTalkApp<G> {
    pub fn new(gateway: Arc<G>, session: SessionStore) -> Self {
        Self {
            listing: FetchDriver::new(Arc::clone(&gateway)),
            gateway,
            filters: FilterSet::default(),
            session,
        }
    }

    // ---- listing ----

    /// Returns true when a new fetch went out.
    pub fn set_query(&mut self, query: &str) -> bool {
        self.listing.set_query(query)
    }

    pub fn refresh(&mut self) {
        self.listing.refresh();
    }

    pub fn poll(&mut self) -> usize {
        self.listing.poll()
    }

    pub async fn settle(&mut self) -> &FetchState {
        self.listing.settle().await
    }

    pub fn query(&self) -> &str {
        self.listing.controller().query()
    }

    pub const fn fetch(&self) -> &FetchController {
        self.listing.controller()
    }

    /// Filter changes are local; nothing is refetched.
    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    pub const fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn heading(&self) -> String {
        view::listing_heading(self.query())
    }

    pub fn visible_movies(&self) -> Vec<MovieRecord> {
        filters::apply(self.listing.state().movies(), &self.filters)
    }

    pub fn list_view(&self) -> ListView {
        view::compose_list(
            self.listing.state(),
            &self.filters,
            self.listing.controller().diagnostic(),
        )
    }

    // ---- detail ----

    pub async fn detail(&self, movie_id: i64) -> Result<DetailView, GatewayError> {
        let (movie, reviews) = self.gateway.get_movie_detail(movie_id).await?;
        let trailers = match self.gateway.trailers(movie_id).await {
            Ok(trailers) => trailers,
            Err(err) => {
                warn!("trailer lookup for movie {movie_id} failed: {err}");
                Vec::new()
            }
        };
        Ok(detail::compose_detail(&movie, &reviews, &trailers))
    }

    // ---- accounts ----

    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn sign_up(&self, input: &RegisterInput) -> Result<Account, GatewayError> {
        let account = self.gateway.register_account(input).await?;
        info!("registered account {} ({})", account.username, account.id);
        Ok(account)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AppError> {
        let session = self.gateway.authenticate(credentials).await?;
        self.session.save(&session)?;
        Ok(session)
    }

    pub fn sign_out(&self) -> Result<(), AppError> {
        self.session.clear()?;
        Ok(())
    }

    fn signed_in_user(&self) -> Result<Account, AppError> {
        match self.session.current() {
            Some(s) => Ok(s.user),
            None => {
                warn!("action needs a signed-in user");
                Err(AppError::SignedOut)
            }
        }
    }

    pub async fn post_review(
        &self,
        movie_id: i64,
        comment: &str,
        rating: i32,
    ) -> Result<Review, AppError> {
        let user = self.signed_in_user()?;
        let input = ReviewInput {
            user_id: user.id,
            movie_id,
            comment: comment.trim().to_string(),
            rating,
        };
        Ok(self.gateway.submit_review(&input).await?)
    }

    pub async fn my_reviews(&self) -> Result<Vec<Review>, AppError> {
        let user = self.signed_in_user()?;
        Ok(self.gateway.list_user_reviews(user.id).await?)
    }

    pub async fn submit_movie(
        &self,
        submission: &MovieSubmission,
    ) -> Result<SubmittedMovie, AppError> {
        self.signed_in_user()?;
        Ok(self.gateway.submit_movie(submission).await?)
    }
}
