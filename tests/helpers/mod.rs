//! Test helpers: an in-memory storage with the same locking semantics as PostgreSQL, and a
//! mock remote `/eval` service.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use recruitair::config::RemoteApiConfig;
use recruitair::models::{
    applicant::Applicant,
    criterion::{Criterion, NewCriterion},
    job_offer::{JobOffer, JobOfferStatus},
    score::EvaluationPair,
};
use recruitair::pipeline::{Batch, ClaimSource, CriteriaSink, ScoreSink, Staged, Storage};
use recruitair::services::remote::RemoteApiClient;

pub const TOKEN: &str = "test-token";

/// Marker in a request body that makes the mock sleep past the client timeout.
pub const SLOW_MARKER: &str = "__slow__";

/// Committed state shared by every batch, plus the locks currently held.
#[derive(Default)]
pub struct Tables {
    pub offers: Vec<JobOffer>,
    pub criteria: Vec<Criterion>,
    pub applicants: Vec<Applicant>,
    pub scores: BTreeMap<(i32, i32), f64>,
    row_locks: HashSet<i32>,
    advisory_locks: HashSet<i64>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Rows created later get later timestamps, so ordering follows insertion.
    fn timestamp(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + ChronoDuration::seconds(i64::from(self.next_id))
    }

    pub fn add_offer(&mut self, text: &str) -> i32 {
        let id = self.next_id();
        let created_at = self.timestamp();
        self.offers.push(JobOffer {
            id,
            text: text.to_string(),
            status: JobOfferStatus::Pending,
            created_at,
        });
        id
    }

    pub fn add_criterion(&mut self, offer_id: i32, description: &str, importance: f64) -> i32 {
        let id = self.next_id();
        let created_at = self.timestamp();
        self.criteria.push(Criterion {
            id,
            offer_id,
            description: description.to_string(),
            importance,
            created_at,
        });
        id
    }

    pub fn add_applicant(&mut self, offer_id: i32, cv: &str) -> i32 {
        let id = self.next_id();
        let created_at = self.timestamp();
        self.applicants.push(Applicant {
            id,
            offer_id,
            cv: cv.to_string(),
            created_at,
        });
        id
    }

    pub fn offer(&self, id: i32) -> &JobOffer {
        self.offers.iter().find(|o| o.id == id).expect("offer exists")
    }

    pub fn criteria_of(&self, offer_id: i32) -> Vec<&Criterion> {
        self.criteria.iter().filter(|c| c.offer_id == offer_id).collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    pub tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.lock().unwrap())
    }
}

impl Storage for MemoryStorage {
    type Batch = MemoryBatch;

    async fn begin(&self) -> Result<MemoryBatch, sqlx::Error> {
        Ok(MemoryBatch {
            tables: self.tables.clone(),
            state: Mutex::new(BatchState::default()),
        })
    }
}

#[derive(Default)]
struct BatchState {
    held_rows: Vec<i32>,
    held_keys: Vec<i64>,
    done_offers: Vec<i32>,
    new_criteria: Vec<(i32, NewCriterion)>,
    new_scores: Vec<(i32, i32, f64)>,
}

/// Writes are buffered until commit; locks are released on commit or rollback.
pub struct MemoryBatch {
    tables: Arc<Mutex<Tables>>,
    state: Mutex<BatchState>,
}

impl MemoryBatch {
    fn release(&self, tables: &mut Tables) {
        let state = self.state.lock().unwrap();
        for id in &state.held_rows {
            tables.row_locks.remove(id);
        }
        for key in &state.held_keys {
            tables.advisory_locks.remove(key);
        }
    }
}

impl Batch for MemoryBatch {
    async fn commit(self) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        self.release(&mut tables);

        let mut state = self.state.lock().unwrap();
        for offer_id in state.done_offers.drain(..) {
            if let Some(offer) = tables.offers.iter_mut().find(|o| o.id == offer_id) {
                offer.status = JobOfferStatus::Done;
            }
        }
        for (offer_id, criterion) in state.new_criteria.drain(..) {
            tables.add_criterion(offer_id, &criterion.description, criterion.importance);
        }
        for (applicant_id, criterion_id, score) in state.new_scores.drain(..) {
            tables.scores.entry((applicant_id, criterion_id)).or_insert(score);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        self.release(&mut tables);
        Ok(())
    }
}

impl ClaimSource<JobOffer> for MemoryBatch {
    async fn candidates(&self, offset: i64, limit: i64) -> Result<Vec<JobOffer>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        // SKIP LOCKED only skips rows locked by other transactions
        let mut pending: Vec<JobOffer> = tables
            .offers
            .iter()
            .filter(|o| {
                o.status == JobOfferStatus::Pending
                    && (!tables.row_locks.contains(&o.id) || state.held_rows.contains(&o.id))
            })
            .cloned()
            .collect();
        pending.sort_by_key(|o| (o.created_at, o.id));

        let selected: Vec<JobOffer> = pending
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        for offer in &selected {
            if tables.row_locks.insert(offer.id) {
                state.held_rows.push(offer.id);
            }
        }
        Ok(selected)
    }

    async fn try_claim(&self, _offer: &JobOffer) -> Result<bool, sqlx::Error> {
        Ok(true)
    }
}

impl CriteriaSink for MemoryBatch {
    async fn stage_criteria(
        &self,
        offer: &JobOffer,
        criteria: &[NewCriterion],
    ) -> Result<Staged, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        let pending = tables
            .offers
            .iter()
            .any(|o| o.id == offer.id && o.status == JobOfferStatus::Pending);
        if !pending || state.done_offers.contains(&offer.id) {
            return Ok(Staged::Discarded);
        }

        state.done_offers.push(offer.id);
        for criterion in criteria {
            state.new_criteria.push((offer.id, criterion.clone()));
        }
        Ok(Staged::Inserted)
    }
}

impl ClaimSource<EvaluationPair> for MemoryBatch {
    async fn candidates(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EvaluationPair>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut pairs: Vec<EvaluationPair> = Vec::new();
        for applicant in &tables.applicants {
            for criterion in &tables.criteria {
                if criterion.offer_id == applicant.offer_id
                    && !tables.scores.contains_key(&(applicant.id, criterion.id))
                {
                    pairs.push(EvaluationPair {
                        applicant: applicant.clone(),
                        criterion: criterion.clone(),
                    });
                }
            }
        }
        pairs.sort_by_key(|p| (p.applicant.created_at, p.applicant.id, p.criterion.id));

        Ok(pairs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn try_claim(&self, pair: &EvaluationPair) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let key = pair.lock_key();
        let mut state = self.state.lock().unwrap();
        if state.held_keys.contains(&key) {
            // advisory locks are re-entrant within a transaction
            return Ok(true);
        }
        if !tables.advisory_locks.insert(key) {
            return Ok(false);
        }
        state.held_keys.push(key);
        Ok(true)
    }
}

impl ScoreSink for MemoryBatch {
    async fn stage_score(&self, pair: &EvaluationPair, score: f64) -> Result<Staged, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        let key = (pair.applicant.id, pair.criterion.id);
        let criterion_unchanged = tables
            .criteria
            .iter()
            .any(|c| c.id == pair.criterion.id && c.description == pair.criterion.description);
        let already_scored = tables.scores.contains_key(&key)
            || state.new_scores.iter().any(|(a, c, _)| (*a, *c) == key);

        if !criterion_unchanged || already_scored {
            return Ok(Staged::Discarded);
        }
        state.new_scores.push((key.0, key.1, score));
        Ok(Staged::Inserted)
    }
}

type Reply = dyn Fn(&Value) -> (StatusCode, Value) + Send + Sync;

/// In-process stand-in for the remote `/eval` service.
#[derive(Clone)]
pub struct MockRemote {
    pub calls: Arc<Mutex<Vec<Value>>>,
    reply: Arc<Reply>,
}

impl MockRemote {
    pub fn new(reply: impl Fn(&Value) -> (StatusCode, Value) + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(reply),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Serve on an ephemeral port and return a client pointed at it.
    pub async fn spawn(&self, timeout: Duration) -> RemoteApiClient {
        let app = Router::new()
            .route("/eval", post(mock_eval))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RemoteApiConfig {
            base_url: format!("http://{addr}"),
            bearer_token: TOKEN.to_string(),
        };
        RemoteApiClient::new(&config, timeout).unwrap()
    }
}

async fn mock_eval(
    State(mock): State<MockRemote>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {TOKEN}");
    if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"detail": "bad token"})),
        );
    }

    mock.calls.lock().unwrap().push(body.clone());
    if body.to_string().contains(SLOW_MARKER) {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    let (status, reply) = (mock.reply)(&body);
    (status, Json(reply))
}
