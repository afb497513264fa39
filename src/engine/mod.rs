//! The catalog view engine: sole owner of the Track list.
//!
//! Every remote operation is split in two. A `begin_*` call validates input and
//! hands back a [`Request`]; whoever runs it later feeds the resulting
//! [`Completion`] to [`CatalogEngine::complete`]. The list only changes inside
//! `complete`, and only when the gateway round trip succeeded, so a failure
//! always leaves it exactly as it was.
//!
//! Completions are applied in arrival order. Two requests for the same Track
//! (say an update and a delete) are not coalesced: whichever finishes last
//! wins, and an update that lands after its Track was deleted is discarded
//! instead of resurrecting it.

mod request;


use std::collections::{BTreeMap, HashMap, HashSet};

use log::{info, warn};

pub use request::{Completion, Request, RequestId, RequestOp, Response};

use crate::error::{CatalogError, Operation, TransportError};
use crate::gateway::CatalogGateway;
use crate::models::{clamp_rating, Draft, Track, ViewQuery, UNTITLED};
use crate::view::{derive, CatalogView};

/// Lifecycle of the Track list.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Loading,
    Ready,
    /// The last load failed; the message is meant for display.
    LoadFailed(String),
}

/// Lifecycle of a single request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Pending,
    Applied,
    Failed,
    Discarded,
}

/// What a completion did to the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Loaded { count: usize },
    Created(Track),
    Updated(Track),
    Deleted(Track),
}

/// Result of feeding a completion to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(Change),
    /// The round trip failed; the list is unchanged.
    Failed(TransportError),
    /// The completion no longer applies (superseded, torn down, or its Track
    /// is gone); the list is unchanged.
    Discarded,
}

/// Details shown while asking the user to confirm a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePrompt {
    pub id: i64,
    pub title: String,
}

impl DeletePrompt {
    /// The user said yes.
    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete { id: self.id }
    }
}

/// Proof of confirmation required by [`CatalogEngine::begin_delete`]. Only
/// obtainable through [`DeletePrompt::confirm`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedDelete {
    id: i64,
}

impl ConfirmedDelete {
    pub fn id(&self) -> i64 {
        self.id
    }
}

/// How many settled request statuses are remembered. Older ones read as
/// [`RequestStatus::Idle`].
const SETTLED_CAPACITY: usize = 256;

/// Bookkeeping for a request that has not completed yet.
#[derive(Debug, Copy, Clone)]
struct InFlight {
    operation: Operation,
    /// Track the request was issued for; `None` for loads and creates.
    target: Option<i64>,
}

pub struct CatalogEngine {
    state: CatalogState,
    tracks: Vec<Track>,
    query: ViewQuery,
    view: CatalogView,
    list_limit: usize,
    activated: bool,
    torn_down: bool,
    next_request: u64,
    active_load: Option<RequestId>,
    pending: HashMap<RequestId, InFlight>,
    settled: BTreeMap<RequestId, RequestStatus>,
}

impl CatalogEngine {
    pub fn new(list_limit: usize, query: ViewQuery) -> Self {
        let mut engine = Self {
            state: CatalogState::Loading,
            tracks: Vec::new(),
            query,
            view: CatalogView::default(),
            list_limit,
            activated: false,
            torn_down: false,
            next_request: 0,
            active_load: None,
            pending: HashMap::new(),
            settled: BTreeMap::new(),
        };
        engine.refresh_view();
        engine
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: i64) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    pub fn is_ready(&self) -> bool {
        self.state == CatalogState::Ready
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn is_pending(&self, request: RequestId) -> bool {
        self.pending.contains_key(&request)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Where `request` stands. Only the most recent settled requests are
    /// remembered; anything older reads as `Idle`.
    pub fn status(&self, request: RequestId) -> RequestStatus {
        if self.pending.contains_key(&request) {
            RequestStatus::Pending
        } else {
            self.settled
                .get(&request)
                .copied()
                .unwrap_or(RequestStatus::Idle)
        }
    }

    /// Replace the query and recompute the view.
    pub fn set_query(&mut self, query: ViewQuery) {
        self.query = query;
        self.refresh_view();
    }

    /// The initial load. Only the first call yields a request.
    pub fn activate(&mut self) -> Option<Request> {
        if self.activated || self.torn_down {
            return None;
        }
        self.activated = true;
        Some(self.begin_load())
    }

    /// Explicit reload, superseding any load still in flight. The current list
    /// stays in place until the new one arrives.
    pub fn reload(&mut self) -> Request {
        self.activated = true;
        self.begin_load()
    }

    fn begin_load(&mut self) -> Request {
        if let Some(previous) = self.active_load.take() {
            self.pending.remove(&previous);
            self.settle(previous, RequestStatus::Discarded);
        }
        self.state = CatalogState::Loading;
        let request = self.issue(RequestOp::Load {
            limit: self.list_limit,
        });
        self.active_load = Some(request.id());
        info!("loading up to {} tracks ({})", self.list_limit, request.id());
        request
    }

    pub fn begin_create(&mut self, draft: &Draft) -> Result<Request, CatalogError> {
        self.ensure_ready()?;
        draft.validate()?;
        Ok(self.issue(RequestOp::Create(draft.clone())))
    }

    pub fn begin_update(&mut self, id: i64, draft: &Draft) -> Result<Request, CatalogError> {
        self.ensure_ready()?;
        if self.track(id).is_none() {
            return Err(CatalogError::UnknownTrack(id));
        }
        draft.validate()?;
        Ok(self.issue(RequestOp::Update {
            id,
            draft: draft.clone(),
        }))
    }

    /// First half of a delete: look the Track up so the user can confirm it.
    pub fn prepare_delete(&self, id: i64) -> Result<DeletePrompt, CatalogError> {
        self.ensure_ready()?;
        let track = self.track(id).ok_or(CatalogError::UnknownTrack(id))?;
        Ok(DeletePrompt {
            id,
            title: track.title.clone(),
        })
    }

    pub fn begin_delete(&mut self, confirmed: ConfirmedDelete) -> Result<Request, CatalogError> {
        self.ensure_ready()?;
        if self.track(confirmed.id).is_none() {
            return Err(CatalogError::UnknownTrack(confirmed.id));
        }
        Ok(self.issue(RequestOp::Delete { id: confirmed.id }))
    }

    /// Apply the result of a request. This is the only place the list changes.
    pub fn complete(&mut self, completion: Completion) -> Outcome {
        let Completion { request, result } = completion;

        if self.torn_down {
            return Outcome::Discarded;
        }
        let Some(in_flight) = self.pending.remove(&request) else {
            self.settle(request, RequestStatus::Discarded);
            return Outcome::Discarded;
        };
        if in_flight.operation == Operation::Load && self.active_load != Some(request) {
            self.settle(request, RequestStatus::Discarded);
            return Outcome::Discarded;
        }

        let outcome = match result {
            Err(err) => self.fail(in_flight.operation, err),
            Ok(response) => self.apply(response, in_flight.target),
        };

        let status = match &outcome {
            Outcome::Applied(_) => RequestStatus::Applied,
            Outcome::Failed(_) => RequestStatus::Failed,
            Outcome::Discarded => RequestStatus::Discarded,
        };
        self.settle(request, status);
        if matches!(outcome, Outcome::Applied(_)) {
            self.refresh_view();
        }
        outcome
    }

    /// Stop accepting completions. Anything still in flight is dropped when it
    /// arrives.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.active_load = None;
        self.pending.clear();
    }

    /// Blocking initial load (or reload) through `gateway`.
    pub fn load_with(&mut self, gateway: &dyn CatalogGateway) -> Outcome {
        let request = self.reload();
        let completion = request.execute(gateway);
        self.complete(completion)
    }

    pub fn create_with(
        &mut self,
        gateway: &dyn CatalogGateway,
        draft: &Draft,
    ) -> Result<Track, CatalogError> {
        let request = self.begin_create(draft)?;
        match self.complete(request.execute(gateway)) {
            Outcome::Applied(Change::Created(track)) => Ok(track),
            Outcome::Failed(err) => Err(err.into()),
            _ => Err(CatalogError::NotReady),
        }
    }

    pub fn update_with(
        &mut self,
        gateway: &dyn CatalogGateway,
        id: i64,
        draft: &Draft,
    ) -> Result<Track, CatalogError> {
        let request = self.begin_update(id, draft)?;
        match self.complete(request.execute(gateway)) {
            Outcome::Applied(Change::Updated(track)) => Ok(track),
            Outcome::Failed(err) => Err(err.into()),
            _ => Err(CatalogError::UnknownTrack(id)),
        }
    }

    pub fn delete_with(
        &mut self,
        gateway: &dyn CatalogGateway,
        confirmed: ConfirmedDelete,
    ) -> Result<Track, CatalogError> {
        let id = confirmed.id();
        let request = self.begin_delete(confirmed)?;
        match self.complete(request.execute(gateway)) {
            Outcome::Applied(Change::Deleted(track)) => Ok(track),
            Outcome::Failed(err) => Err(err.into()),
            _ => Err(CatalogError::UnknownTrack(id)),
        }
    }

    fn ensure_ready(&self) -> Result<(), CatalogError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CatalogError::NotReady)
        }
    }

    fn issue(&mut self, op: RequestOp) -> Request {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        let target = match &op {
            RequestOp::Update { id, .. } | RequestOp::Delete { id } => Some(*id),
            RequestOp::Load { .. } | RequestOp::Create(_) => None,
        };
        self.pending.insert(
            id,
            InFlight {
                operation: op.operation(),
                target,
            },
        );
        Request::new(id, op)
    }

    fn settle(&mut self, request: RequestId, status: RequestStatus) {
        self.settled.insert(request, status);
        while self.settled.len() > SETTLED_CAPACITY {
            self.settled.pop_first();
        }
    }

    fn fail(&mut self, operation: Operation, err: TransportError) -> Outcome {
        warn!("{err}");
        if operation == Operation::Load {
            self.active_load = None;
            self.state = CatalogState::LoadFailed(err.to_string());
        }
        Outcome::Failed(err)
    }

    fn apply(&mut self, response: Response, target: Option<i64>) -> Outcome {
        match response {
            Response::Loaded(tracks) => {
                self.active_load = None;
                self.tracks = dedupe(tracks.into_iter().map(normalize).collect());
                self.state = CatalogState::Ready;
                info!("catalog ready with {} tracks", self.tracks.len());
                Outcome::Applied(Change::Loaded {
                    count: self.tracks.len(),
                })
            }
            Response::Created(track) => {
                let mut track = normalize(track);
                if self.track(track.id).is_some() {
                    let reassigned = self.free_id();
                    warn!(
                        "remote returned id {} which is already listed; using {reassigned}",
                        track.id
                    );
                    track.id = reassigned;
                }
                self.tracks.insert(0, track.clone());
                Outcome::Applied(Change::Created(track))
            }
            Response::Updated(track) => {
                let mut track = normalize(track);
                let id = target.unwrap_or(track.id);
                if track.id != id {
                    warn!("remote answered update of {id} with id {}; keeping {id}", track.id);
                    track.id = id;
                }
                let Some(slot) = self.tracks.iter_mut().find(|t| t.id == id) else {
                    info!("update for track {id} arrived after it was removed");
                    return Outcome::Discarded;
                };
                if track.artists.is_empty() {
                    track.artists = slot.artists.clone();
                }
                if track.cover_image_url.is_none() {
                    track.cover_image_url = slot.cover_image_url.clone();
                }
                *slot = track.clone();
                Outcome::Applied(Change::Updated(track))
            }
            Response::Deleted(id) => match self.tracks.iter().position(|t| t.id == id) {
                Some(index) => Outcome::Applied(Change::Deleted(self.tracks.remove(index))),
                None => Outcome::Discarded,
            },
        }
    }

    /// An id not used by any listed Track, preferring one past the largest.
    fn free_id(&self) -> i64 {
        let max = self.tracks.iter().map(|t| t.id).max().unwrap_or(0);
        let min = self.tracks.iter().map(|t| t.id).min().unwrap_or(0);
        max.checked_add(1)
            .or_else(|| min.checked_sub(1))
            .unwrap_or_else(|| {
                (0..i64::MAX)
                    .find(|candidate| self.track(*candidate).is_none())
                    .unwrap_or_default()
            })
    }

    fn refresh_view(&mut self) {
        self.view = derive(&self.tracks, &self.query);
    }
}

/// Hold a Track from any gateway to the list invariants: rating within range
/// and a non-blank title.
fn normalize(mut track: Track) -> Track {
    track.rating = clamp_rating(track.rating);
    let title = track.title.trim();
    track.title = if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    };
    track
}

/// Drop repeated ids, keeping the first occurrence.
fn dedupe(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| {
            let fresh = seen.insert(track.id);
            if !fresh {
                warn!("dropping duplicate remote id {}", track.id);
            }
            fresh
        })
        .collect()
}
