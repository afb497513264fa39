//! Runs gateway requests off the UI thread. Each request gets its own worker
//! so slow calls never hold up unrelated ones; results come back over a
//! channel in completion order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use log::{debug, error};

use crate::engine::{Completion, Request};
use crate::gateway::CatalogGateway;

pub struct Dispatcher {
    gateway: Arc<dyn CatalogGateway>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            gateway,
            sender,
            receiver,
        }
    }

    /// Start `request` on a worker thread.
    pub fn submit(&self, request: Request) {
        let gateway = Arc::clone(&self.gateway);
        let sender = self.sender.clone();
        let name = format!("gateway-{}", request.id());
        let fallback = request.clone();
        debug!("dispatching {:?} as {name}", request.op().operation());

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let completion = request.execute(gateway.as_ref());
            // The receiver is gone once the UI has shut down; nothing to do.
            let _ = sender.send(completion);
        });

        if let Err(err) = spawned {
            error!("failed to spawn gateway worker: {err}");
            let _ = self
                .sender
                .send(fallback.fail(format!("could not start request: {err}")));
        }
    }

    /// Every completion that has arrived so far, without blocking.
    pub fn drain(&self) -> Vec<Completion> {
        self.receiver.try_iter().collect()
    }

    /// Block until the next completion arrives.
    pub fn wait(&self) -> Option<Completion> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::engine::{CatalogEngine, Change, Outcome};
    use crate::error::{Operation, TransportError};
    use crate::models::{Draft, Track, ViewQuery};

    struct SlowGateway {
        delay: Duration,
        calls: Mutex<Vec<Operation>>,
    }

    impl CatalogGateway for SlowGateway {
        fn list(&self, limit: usize) -> Result<Vec<Track>, TransportError> {
            self.calls.lock().unwrap().push(Operation::Load);
            thread::sleep(self.delay);
            Ok((1..=limit as i64)
                .map(|id| Track::new(id, format!("Track {id}"), "Album", 3.0, 200))
                .collect())
        }

        fn create(&self, draft: &Draft) -> Result<Track, TransportError> {
            self.calls.lock().unwrap().push(Operation::Create);
            Ok(Track::new(
                100,
                draft.title.clone(),
                draft.album.clone(),
                draft.rating.unwrap_or_default(),
                draft.duration_seconds,
            ))
        }

        fn update(&self, _id: i64, _draft: &Draft) -> Result<Track, TransportError> {
            Err(TransportError::Status {
                operation: Operation::Update,
                status: 500,
            })
        }

        fn delete(&self, _id: i64) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn completions_flow_back_to_the_engine() {
        let gateway = Arc::new(SlowGateway {
            delay: Duration::from_millis(10),
            calls: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(gateway.clone());
        let mut engine = CatalogEngine::new(3, ViewQuery::default());

        dispatcher.submit(engine.activate().unwrap());
        let completion = dispatcher.wait().unwrap();
        assert_eq!(
            engine.complete(completion),
            Outcome::Applied(Change::Loaded { count: 3 })
        );

        let draft = Draft {
            title: "Fresh".to_string(),
            duration_seconds: 120,
            rating: Some(4.0),
            album: String::new(),
        };
        dispatcher.submit(engine.begin_create(&draft).unwrap());
        let completion = dispatcher.wait().unwrap();
        assert!(matches!(
            engine.complete(completion),
            Outcome::Applied(Change::Created(_))
        ));
        assert_eq!(engine.tracks()[0].id, 100);
        assert_eq!(
            *gateway.calls.lock().unwrap(),
            vec![Operation::Load, Operation::Create]
        );
    }

    #[test]
    fn drain_returns_nothing_when_idle() {
        let gateway = Arc::new(SlowGateway {
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(gateway);
        assert!(dispatcher.drain().is_empty());
    }

    #[test]
    fn teardown_drops_a_load_still_in_flight() {
        let gateway = Arc::new(SlowGateway {
            delay: Duration::from_millis(50),
            calls: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(gateway);
        let mut engine = CatalogEngine::new(2, ViewQuery::default());

        dispatcher.submit(engine.activate().unwrap());
        engine.teardown();
        assert!(engine.is_torn_down());
        assert!(engine.activate().is_none());
        let completion = dispatcher.wait().unwrap();

        assert_eq!(engine.complete(completion), Outcome::Discarded);
        assert!(engine.tracks().is_empty());
    }
}
