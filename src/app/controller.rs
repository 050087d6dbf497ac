// src/app/controller.rs
use std::sync::Arc;

use itertools::Itertools;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::gateway::{GatewayError, MovieSource};
use super::types::{FetchRequest, FetchResponse, FetchState, FetchTicket};

/// Upper bound on responses folded in by a single `poll`.
const MAX_RESPONSES_PER_POLL: usize = 16;

/// Owns the fetch lifecycle for one listing slot.
///
/// Every issued request gets a sequence number; only a response carrying the
/// latest number may move the state. Superseded calls still complete, they
/// just have no effect.
#[derive(Debug)]
pub struct FetchController {
    query: String,
    state: FetchState,
    latest_seq: u64,
    diagnostic: Option<GatewayError>,
    discarded: u64,
}

impl Default for FetchController {
    fn default() -> Self {
        Self {
            query: String::new(),
            state: FetchState::Idle,
            latest_seq: 0,
            diagnostic: None,
            discarded: 0,
        }
    }
}

impl FetchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub const fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Shape problem reported alongside the current `Loaded` state, if any.
    pub const fn diagnostic(&self) -> Option<&GatewayError> {
        self.diagnostic.as_ref()
    }

    pub const fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Issue a request for the current query (first mount, manual refresh).
    pub fn start(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.state = FetchState::Loading;
        let ticket = FetchTicket {
            seq: self.latest_seq,
            request: FetchRequest::for_query(&self.query),
        };
        debug!("fetch #{} issued: {:?}", ticket.seq, ticket.request);
        ticket
    }

    /// Returns a ticket only when the query actually changed.
    pub fn set_query(&mut self, query: &str) -> Option<FetchTicket> {
        if query == self.query && !matches!(self.state, FetchState::Idle) {
            return None;
        }
        self.query = query.to_string();
        Some(self.start())
    }

    /// Fold one response into the state. Returns false when it was discarded.
    pub fn accept(&mut self, resp: FetchResponse) -> bool {
        if resp.seq != self.latest_seq {
            self.discarded += 1;
            if resp.seq > self.latest_seq {
                warn!("fetch #{} was never issued; dropping it", resp.seq);
            } else {
                debug!(
                    "fetch #{} superseded by #{}; dropping it",
                    resp.seq, self.latest_seq
                );
            }
            return false;
        }
        if !self.state.is_loading() {
            self.discarded += 1;
            debug!("fetch #{} already settled; dropping duplicate", resp.seq);
            return false;
        }

        match resp.result {
            Ok(movies) => {
                let fetched = movies.len();
                let unique: Vec<_> = movies.into_iter().unique_by(|m| m.id).collect();
                if unique.len() < fetched {
                    debug!(
                        "fetch #{}: dropped {} duplicate id(s)",
                        resp.seq,
                        fetched - unique.len()
                    );
                }
                info!("fetch #{} loaded {} movie(s)", resp.seq, unique.len());
                self.diagnostic = None;
                self.state = FetchState::Loaded(unique);
            }
            Err(err) if err.is_shape_error() => {
                warn!("fetch #{}: {err}; showing an empty listing", resp.seq);
                self.diagnostic = Some(err);
                self.state = FetchState::Loaded(Vec::new());
            }
            Err(err) => {
                warn!("fetch #{} failed: {err}", resp.seq);
                self.diagnostic = None;
                self.state = FetchState::Failed(err.to_string());
            }
        }
        true
    }
}

/// Runs a [`FetchController`] against a live source: each ticket becomes a
/// spawned task whose result comes back over a channel.
pub struct FetchDriver<S: MovieSource + ?Sized + 'static> {
    source: Arc<S>,
    controller: FetchController,
    done_tx: mpsc::UnboundedSender<FetchResponse>,
    done_rx: mpsc::UnboundedReceiver<FetchResponse>,
}

impl<S: MovieSource + ?Sized + 'static> FetchDriver<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            source,
            controller: FetchController::new(),
            done_tx,
            done_rx,
        }
    }

    pub const fn controller(&self) -> &FetchController {
        &self.controller
    }

    pub const fn state(&self) -> &FetchState {
        self.controller.state()
    }

    /// Must be called from inside a tokio runtime.
    pub fn set_query(&mut self, query: &str) -> bool {
        match self.controller.set_query(query) {
            Some(ticket) => {
                self.spawn(ticket);
                true
            }
            None => false,
        }
    }

    pub fn refresh(&mut self) {
        let ticket = self.controller.start();
        self.spawn(ticket);
    }

    /// The call runs in its own task so a panic inside the source still
    /// settles this ticket as a failure.
    fn spawn(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let done_tx = self.done_tx.clone();
        let FetchTicket { seq, request } = ticket;
        let call = tokio::spawn(async move { source.fetch(&request).await });
        tokio::spawn(async move {
            let result = match call.await {
                Ok(result) => result,
                Err(err) => {
                    warn!("fetch #{seq} task died: {err}");
                    Err(GatewayError::Aborted(err.to_string()))
                }
            };
            // receiver only goes away with the driver
            let _ = done_tx.send(FetchResponse { seq, result });
        });
    }

    /// Fold in whatever responses have already arrived, without waiting.
    pub fn poll(&mut self) -> usize {
        let mut drained = 0usize;
        while drained < MAX_RESPONSES_PER_POLL {
            match self.done_rx.try_recv() {
                Ok(resp) => {
                    drained += 1;
                    self.controller.accept(resp);
                }
                Err(_) => break,
            }
        }
        drained
    }

    /// Wait until the latest request has settled.
    pub async fn settle(&mut self) -> &FetchState {
        while self.controller.state().is_loading() {
            match self.done_rx.recv().await {
                Some(resp) => {
                    self.controller.accept(resp);
                }
                None => break,
            }
        }
        self.controller.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::types::MovieRecord;

    fn movie(id: i64, title: &str) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            release_date: None,
            poster_path: None,
            vote_average: None,
            overview: None,
            top_cast: Vec::new(),
        }
    }

    fn ok(seq: u64, movies: Vec<MovieRecord>) -> FetchResponse {
        FetchResponse {
            seq,
            result: Ok(movies),
        }
    }

    #[test]
    fn starts_idle_and_first_query_loads() {
        let mut c = FetchController::new();
        assert_eq!(c.state(), &FetchState::Idle);
        let t = c.set_query("").unwrap();
        assert_eq!(t.seq, 1);
        assert_eq!(t.request, FetchRequest::Popular { page: 1 });
        assert!(c.state().is_loading());
    }

    #[test]
    fn unchanged_query_does_not_refetch() {
        let mut c = FetchController::new();
        c.set_query("alien").unwrap();
        assert!(c.set_query("alien").is_none());
        assert!(c.set_query("").is_some());
        assert_eq!(c.latest_seq(), 2);
    }

    #[test]
    fn stale_response_cannot_overwrite_newer_one() {
        let mut c = FetchController::new();
        let a = c.set_query("a").unwrap();
        let ab = c.set_query("ab").unwrap();

        assert!(c.accept(ok(ab.seq, vec![movie(2, "ab")])));
        assert!(!c.accept(ok(a.seq, vec![movie(1, "a")])));

        assert_eq!(c.state(), &FetchState::Loaded(vec![movie(2, "ab")]));
        assert_eq!(c.discarded(), 1);
    }

    #[test]
    fn stale_response_while_loading_is_ignored() {
        let mut c = FetchController::new();
        let a = c.set_query("a").unwrap();
        c.set_query("ab").unwrap();
        assert!(!c.accept(ok(a.seq, vec![movie(1, "a")])));
        assert!(c.state().is_loading());
    }

    #[test]
    fn errors_map_to_failed_and_shape_errors_to_empty_loaded() {
        let mut c = FetchController::new();
        let t = c.set_query("x").unwrap();
        c.accept(FetchResponse {
            seq: t.seq,
            result: Err(GatewayError::NetworkUnreachable("timed out".into())),
        });
        assert!(matches!(c.state(), FetchState::Failed(reason) if reason.contains("timed out")));
        assert!(c.diagnostic().is_none());

        let t = c.set_query("y").unwrap();
        c.accept(FetchResponse {
            seq: t.seq,
            result: Err(GatewayError::InvalidResponseShape {
                context: "/search/movie".into(),
                missing: "results".into(),
            }),
        });
        assert_eq!(c.state(), &FetchState::Loaded(Vec::new()));
        assert!(c.diagnostic().is_some_and(GatewayError::is_shape_error));
    }

    #[test]
    fn duplicate_ids_are_collapsed_keeping_first() {
        let mut c = FetchController::new();
        let t = c.set_query("").unwrap();
        c.accept(ok(t.seq, vec![movie(1, "first"), movie(2, "b"), movie(1, "again")]));
        let titles: Vec<_> = c.state().movies().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "b"]);
    }

    struct PanickingSource;

    #[async_trait::async_trait]
    impl MovieSource for PanickingSource {
        async fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>, GatewayError> {
            panic!("search for {query} blew up");
        }

        async fn list_popular_movies(&self, _page: u32) -> Result<Vec<MovieRecord>, GatewayError> {
            Ok(vec![movie(1, "fine")])
        }
    }

    #[tokio::test]
    async fn panicking_source_settles_as_failed() {
        let mut driver = FetchDriver::new(Arc::new(PanickingSource));
        assert!(driver.set_query("x"));
        let state = tokio::time::timeout(std::time::Duration::from_secs(5), driver.settle())
            .await
            .expect("settle should return after a panicked fetch")
            .clone();
        assert!(matches!(state, FetchState::Failed(reason) if reason.contains("aborted")));

        // the driver keeps working afterwards
        driver.set_query("");
        assert_eq!(driver.settle().await.movies().len(), 1);
    }

    #[test]
    fn unknown_and_duplicate_sequence_numbers_are_dropped() {
        let mut c = FetchController::new();
        let t = c.set_query("q").unwrap();
        assert!(!c.accept(ok(t.seq + 5, vec![])));
        assert!(c.accept(ok(t.seq, vec![movie(1, "q")])));
        assert!(!c.accept(ok(t.seq, vec![])));
        assert_eq!(c.state().movies().len(), 1);
    }
}
