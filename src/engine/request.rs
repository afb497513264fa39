use std::fmt;

use crate::error::{Operation, TransportError};
use crate::gateway::CatalogGateway;
use crate::models::{Draft, Track};

/// Identifies one begun operation so its completion can be matched back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gateway work the engine has validated and is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOp {
    Load { limit: usize },
    Create(Draft),
    Update { id: i64, draft: Draft },
    Delete { id: i64 },
}

impl RequestOp {
    pub fn operation(&self) -> Operation {
        match self {
            RequestOp::Load { .. } => Operation::Load,
            RequestOp::Create(_) => Operation::Create,
            RequestOp::Update { .. } => Operation::Update,
            RequestOp::Delete { .. } => Operation::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: RequestId,
    op: RequestOp,
}

impl Request {
    pub(crate) fn new(id: RequestId, op: RequestOp) -> Self {
        Self { id, op }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn op(&self) -> &RequestOp {
        &self.op
    }

    /// Run the request against `gateway`. Blocks for the duration of the call.
    pub fn execute(&self, gateway: &dyn CatalogGateway) -> Completion {
        let result = match &self.op {
            RequestOp::Load { limit } => gateway.list(*limit).map(Response::Loaded),
            RequestOp::Create(draft) => gateway.create(draft).map(Response::Created),
            RequestOp::Update { id, draft } => gateway.update(*id, draft).map(Response::Updated),
            RequestOp::Delete { id } => gateway.delete(*id).map(|()| Response::Deleted(*id)),
        };
        Completion {
            request: self.id,
            result,
        }
    }

    /// Completion reporting that the request never reached the gateway.
    pub fn fail(&self, message: impl Into<String>) -> Completion {
        Completion {
            request: self.id,
            result: Err(TransportError::Network {
                operation: self.op.operation(),
                message: message.into(),
            }),
        }
    }
}

/// Successful gateway answer for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Loaded(Vec<Track>),
    Created(Track),
    Updated(Track),
    Deleted(i64),
}

/// Result of running a request, fed back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request: RequestId,
    pub result: Result<Response, TransportError>,
}
