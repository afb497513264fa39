//! Remote catalog access split across the wire record shape and the HTTP
//! adapter.

mod http;
mod record;

#[cfg(test)]
mod tests;

pub use http::{HttpGateway, DEFAULT_BASE_URL};
pub use record::{project, pseudo_duration, pseudo_rating, RemotePayload, RemoteRecord};

use crate::error::TransportError;
use crate::models::{Draft, Track};

/// Interface implemented by anything that can serve the remote collection.
/// Implementations touch no local state; the engine decides what to do with
/// the results.
pub trait CatalogGateway: Send + Sync {
    /// Fetch up to `limit` records projected into Tracks.
    fn list(&self, limit: usize) -> Result<Vec<Track>, TransportError>;
    /// Submit a new Track and return it with the remote id.
    fn create(&self, draft: &Draft) -> Result<Track, TransportError>;
    /// Submit changed fields for `id` and return the merged Track.
    fn update(&self, id: i64, draft: &Draft) -> Result<Track, TransportError>;
    fn delete(&self, id: i64) -> Result<(), TransportError>;
}
