use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::api::MatchmakerApi;
use crate::distance::{Coordinate, annotate, sort_by_distance};
use crate::error::{ClientError, Result};
use crate::models::{SearchRequest, TrialRecord, TrialStatus};

/// Requested result ordering. The backend only understands confidence and
/// title; distance ordering is a client-side concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Confidence,
    Title,
    Distance,
}

impl SortBy {
    /// The sort the backend is asked for. Distance substitutes confidence
    /// since the server has no distance concept; the client re-sorts locally.
    pub fn backend_sort(&self) -> &'static str {
        match self {
            Self::Confidence | Self::Distance => "confidence",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Confidence => "confidence",
            Self::Title => "title",
            Self::Distance => "distance",
        };
        f.write_str(s)
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confidence" => Ok(Self::Confidence),
            "title" => Ok(Self::Title),
            "distance" => Ok(Self::Distance),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchFilters {
    pub status: Option<TrialStatus>,
    pub location_contains: Option<String>,
    pub sort_by: SortBy,
    pub limit: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            status: None,
            location_contains: None,
            sort_by: SortBy::default(),
            limit: 10,
        }
    }
}

/// Outcome of a dispatched search
#[derive(Debug)]
pub enum SearchOutcome {
    /// The response belongs to the newest dispatch
    Fresh(Vec<TrialRecord>),
    /// A newer search was dispatched while this one was in flight; the
    /// result must not overwrite displayed state
    Stale,
}

/// Search orchestration over the API client.
///
/// Concurrent dispatches race; each takes a monotonically increasing
/// sequence number, and a completion whose number is no longer the newest is
/// reported stale instead of being returned as results.
pub struct SearchClient {
    api: Arc<MatchmakerApi>,
    seq: AtomicU64,
}

impl SearchClient {
    pub fn new(api: Arc<MatchmakerApi>) -> Self {
        Self {
            api,
            seq: AtomicU64::new(0),
        }
    }

    pub async fn search(
        &self,
        query_text: &str,
        filters: &SearchFilters,
        user_coord: Option<Coordinate>,
    ) -> Result<SearchOutcome> {
        let query = query_text.trim();
        if query.is_empty() {
            return Err(ClientError::Validation(
                "Please enter a search term.".to_string(),
            ));
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, query, "dispatching search");

        let request = SearchRequest {
            query_text: query.to_string(),
            filter_status: filters.status.map(|s| s.as_wire().to_string()).unwrap_or_default(),
            filter_location_contains: filters.location_contains.clone().unwrap_or_default(),
            sort_by: filters.sort_by.backend_sort().to_string(),
            limit: filters.limit,
        };

        let mut trials = self.api.search_trials(&request).await?;

        if self.seq.load(Ordering::SeqCst) != seq {
            info!(seq, "discarding stale search response");
            return Ok(SearchOutcome::Stale);
        }

        if let Some(coord) = user_coord {
            annotate(&mut trials, coord);
        }
        if filters.sort_by == SortBy::Distance {
            sort_by_distance(&mut trials);
        }

        Ok(SearchOutcome::Fresh(trials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::storage::{InMemorySessionStore, SessionStore};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn serve_search(body: Value) -> String {
        let router = Router::new().route(
            "/api/matching/search",
            post(move |Json(req): Json<Value>| {
                let body = body.clone();
                async move {
                    // echo sanity: the backend never sees a distance sort
                    assert_ne!(req["sort_by"], "distance");
                    Json(body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: String) -> SearchClient {
        let store = Arc::new(InMemorySessionStore::new());
        store
            .save(&Session {
                token: "tok".into(),
                user_id: "u1".into(),
                email: "p@x.y".into(),
                first_name: "P".into(),
                last_name: "D".into(),
            })
            .unwrap();
        SearchClient::new(Arc::new(MatchmakerApi::new(base, store)))
    }

    #[tokio::test]
    async fn blank_query_never_reaches_the_network() {
        // an unroutable base url: a network call would fail loudly
        let client = client("http://127.0.0.1:1".to_string());
        match client.search("   ", &SearchFilters::default(), None).await {
            Err(ClientError::Validation(msg)) => assert_eq!(msg, "Please enter a search term."),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn distance_sort_annotates_and_reorders_locally() {
        // Server returns the coordinate-free record first
        let base = serve_search(json!({
            "matched_trials": [
                {"title": "no coords", "confidence_score": 0.9},
                {"title": "paris", "latitude": 48.8566, "longitude": 2.3522, "confidence_score": 0.5}
            ]
        }))
        .await;

        let client = client(base);
        let filters = SearchFilters {
            sort_by: SortBy::Distance,
            ..Default::default()
        };
        let user = Coordinate {
            lat: 51.5074,
            lon: -0.1278,
        };

        match client.search("diabetes", &filters, Some(user)).await.unwrap() {
            SearchOutcome::Fresh(trials) => {
                assert_eq!(trials.len(), 2);
                assert_eq!(trials[0].title, "paris");
                assert!(trials[0].distance_km.unwrap() > 0.0);
                assert_eq!(trials[1].title, "no coords");
                assert!(trials[1].distance_km.is_none());
            }
            SearchOutcome::Stale => panic!("single dispatch cannot be stale"),
        }
    }

    #[tokio::test]
    async fn superseded_dispatch_reports_stale() {
        // The stub delays responses for the query "slow" so a second search
        // can overtake the first while it is in flight.
        let router = Router::new().route(
            "/api/matching/search",
            post(|Json(req): Json<Value>| async move {
                if req["query_text"] == "slow" {
                    tokio::time::sleep(std::time::Duration::from_millis(80)).await;
                }
                Json(json!({"matched_trials": [{"title": "t"}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = Arc::new(client(format!("http://{addr}")));
        let slow = {
            let client = client.clone();
            tokio::spawn(async move {
                client.search("slow", &SearchFilters::default(), None).await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        match client
            .search("asthma", &SearchFilters::default(), None)
            .await
            .unwrap()
        {
            SearchOutcome::Fresh(trials) => assert_eq!(trials.len(), 1),
            SearchOutcome::Stale => panic!("newest dispatch must be fresh"),
        }
        assert!(matches!(
            slow.await.unwrap().unwrap(),
            SearchOutcome::Stale
        ));
    }

    #[test]
    fn backend_sort_substitutes_confidence_for_distance() {
        assert_eq!(SortBy::Distance.backend_sort(), "confidence");
        assert_eq!(SortBy::Confidence.backend_sort(), "confidence");
        assert_eq!(SortBy::Title.backend_sort(), "title");
    }
}
