use std::sync::Mutex;

use track_catalog::{
    CatalogEngine, CatalogError, CatalogGateway, CatalogState, Change, Draft, Operation, Outcome,
    Track, TransportError, ViewQuery,
};

/// In-memory stand-in for the remote collection. Every call is recorded;
/// operations listed in `failing` answer with HTTP 500.
struct ScriptedGateway {
    records: Vec<Track>,
    failing: Vec<Operation>,
    calls: Mutex<Vec<Operation>>,
}

impl ScriptedGateway {
    fn new(count: i64) -> Self {
        let records = (1..=count)
            .map(|id| {
                Track::new(
                    id,
                    format!("Track {id}"),
                    "Demo",
                    (id % 5) as f64,
                    180 + id as u32,
                )
            })
            .collect();
        Self {
            records,
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, operation: Operation) -> Self {
        self.failing.push(operation);
        self
    }

    fn answer(&self, operation: Operation) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(operation);
        if self.failing.contains(&operation) {
            Err(TransportError::Status {
                operation,
                status: 500,
            })
        } else {
            Ok(())
        }
    }
}

impl CatalogGateway for ScriptedGateway {
    fn list(&self, limit: usize) -> Result<Vec<Track>, TransportError> {
        self.answer(Operation::Load)?;
        Ok(self.records.iter().take(limit).cloned().collect())
    }

    fn create(&self, draft: &Draft) -> Result<Track, TransportError> {
        self.answer(Operation::Create)?;
        Ok(Track::new(
            101,
            draft.title.clone(),
            draft.album.clone(),
            draft.rating.unwrap_or_default(),
            draft.duration_seconds,
        ))
    }

    fn update(&self, id: i64, draft: &Draft) -> Result<Track, TransportError> {
        self.answer(Operation::Update)?;
        Ok(Track::new(
            id,
            draft.title.clone(),
            draft.album.clone(),
            draft.rating.unwrap_or_default(),
            draft.duration_seconds,
        ))
    }

    fn delete(&self, _id: i64) -> Result<(), TransportError> {
        self.answer(Operation::Delete)
    }
}

fn ready_engine(gateway: &ScriptedGateway) -> CatalogEngine {
    let mut engine = CatalogEngine::new(12, ViewQuery::default());
    let outcome = engine.load_with(gateway);
    assert_eq!(outcome, Outcome::Applied(Change::Loaded { count: 10 }));
    engine
}

fn position(engine: &CatalogEngine, id: i64) -> Option<usize> {
    engine.tracks().iter().position(|track| track.id == id)
}

#[test]
fn create_prepends_the_echoed_track() {
    let gateway = ScriptedGateway::new(10);
    let mut engine = ready_engine(&gateway);

    let draft = Draft {
        title: "Test Song".to_string(),
        duration_seconds: 200,
        rating: Some(4.5),
        album: "Demo".to_string(),
    };
    let created = engine.create_with(&gateway, &draft).unwrap();

    assert_eq!(created.id, 101);
    assert_eq!(engine.tracks().len(), 11);
    assert_eq!(engine.tracks()[0].id, 101);
    assert_eq!(engine.tracks()[0].title, "Test Song");
    assert_eq!(engine.view().stats.count, 11);
}

#[test]
fn update_replaces_in_place() {
    let gateway = ScriptedGateway::new(10);
    let mut engine = ready_engine(&gateway);
    let before = position(&engine, 5);

    let mut draft = Draft::from_track(engine.track(5).unwrap());
    draft.rating = Some(3.2);
    engine.update_with(&gateway, 5, &draft).unwrap();

    assert_eq!(engine.tracks().len(), 10);
    assert_eq!(position(&engine, 5), before);
    assert_eq!(engine.track(5).unwrap().rating, 3.2);
}

#[test]
fn delete_removes_exactly_one() {
    let gateway = ScriptedGateway::new(10);
    let mut engine = ready_engine(&gateway);

    let confirmed = engine.prepare_delete(7).unwrap().confirm();
    let removed = engine.delete_with(&gateway, confirmed).unwrap();

    assert_eq!(removed.id, 7);
    assert_eq!(engine.tracks().len(), 9);
    assert!(engine.track(7).is_none());
}

#[test]
fn failed_delete_leaves_the_list_alone() {
    let gateway = ScriptedGateway::new(10).failing(Operation::Delete);
    let mut engine = ready_engine(&gateway);
    let before = engine.tracks().to_vec();

    let confirmed = engine.prepare_delete(7).unwrap().confirm();
    let err = engine.delete_with(&gateway, confirmed).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(engine.tracks(), before.as_slice());
}

#[test]
fn failed_initial_load_reports_and_stays_empty() {
    let gateway = ScriptedGateway::new(10).failing(Operation::Load);
    let mut engine = CatalogEngine::new(12, ViewQuery::default());

    let outcome = engine.load_with(&gateway);

    assert!(matches!(outcome, Outcome::Failed(_)));
    match engine.state() {
        CatalogState::LoadFailed(message) => assert!(!message.is_empty()),
        other => panic!("unexpected state {other:?}"),
    }
    assert!(engine.tracks().is_empty());
    assert_eq!(engine.view().stats.mean_rating, 0.0);
}

#[test]
fn invalid_draft_never_reaches_the_gateway() {
    let gateway = ScriptedGateway::new(10);
    let mut engine = ready_engine(&gateway);

    let draft = Draft {
        title: "x".to_string(),
        duration_seconds: 0,
        rating: Some(9.0),
        album: String::new(),
    };
    let err = engine.create_with(&gateway, &draft).unwrap_err();

    let CatalogError::Validation(validation) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(validation.fields().len(), 3);
    assert_eq!(*gateway.calls.lock().unwrap(), vec![Operation::Load]);
}

#[test]
fn update_and_delete_race_leaves_no_ghost_in_either_order() {
    for delete_first in [true, false] {
        let gateway = ScriptedGateway::new(10);
        let mut engine = ready_engine(&gateway);

        let draft = Draft::from_track(engine.track(5).unwrap());
        let update = engine.begin_update(5, &draft).unwrap();
        let delete = engine
            .begin_delete(engine.prepare_delete(5).unwrap().confirm())
            .unwrap();

        let update_done = update.execute(&gateway);
        let delete_done = delete.execute(&gateway);
        if delete_first {
            engine.complete(delete_done);
            assert_eq!(engine.complete(update_done), Outcome::Discarded);
        } else {
            engine.complete(update_done);
            engine.complete(delete_done);
        }

        assert!(engine.track(5).is_none());
        assert_eq!(engine.tracks().len(), 9);
        assert_eq!(engine.pending_count(), 0);
    }
}
