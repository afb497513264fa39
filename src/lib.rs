//! Core library surface for the Track Catalog TUI application.
//!
//! The binary only wires these pieces together; tests and other front ends can
//! drive the engine directly against any [`CatalogGateway`].
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod ui;
pub mod view;

/// Engine entry points and the values its completions produce.
pub use engine::{
    CatalogEngine, CatalogState, Change, Completion, ConfirmedDelete, DeletePrompt, Outcome,
    Request, RequestId, RequestStatus,
};

pub use error::{CatalogError, Operation, TransportError, ValidationError};

/// The remote seam plus its HTTP implementation.
pub use gateway::{CatalogGateway, HttpGateway};

pub use models::{Draft, SortDirection, SortKey, Track, ViewQuery};
pub use view::{CatalogStats, CatalogView};

pub use config::Settings;
pub use dispatch::Dispatcher;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
