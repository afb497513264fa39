//! HTTP adapter for the remote collection backed by `ureq`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::record::{project, RemotePayload, RemoteRecord};
use super::CatalogGateway;
use crate::error::{Operation, TransportError};
use crate::models::{Draft, Track};

/// Public placeholder collection used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

pub struct HttpGateway {
    http_client: ureq::Agent,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, connect_timeout: Duration, read_timeout: Duration) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();
        Self {
            http_client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{id}", self.base_url)
    }

    fn send(
        &self,
        operation: Operation,
        request: ureq::Request,
        payload: Option<&RemotePayload>,
    ) -> Result<ureq::Response, TransportError> {
        debug!("{operation}: {} {}", request.method(), request.url());
        let result = match payload {
            Some(payload) => request.send_json(payload),
            None => request.call(),
        };
        result.map_err(|err| {
            let mapped = map_ureq_error(operation, err);
            warn!("{mapped}");
            mapped
        })
    }

    /// Parse a response body. Failures are logged like every other
    /// transport error.
    fn decode<T: DeserializeOwned>(
        operation: Operation,
        response: ureq::Response,
    ) -> Result<T, TransportError> {
        response.into_json::<T>().map_err(|err| {
            let mapped = TransportError::Decode {
                operation,
                message: err.to_string(),
            };
            warn!("{mapped}");
            mapped
        })
    }
}

impl CatalogGateway for HttpGateway {
    fn list(&self, limit: usize) -> Result<Vec<Track>, TransportError> {
        let request = self
            .http_client
            .get(&self.base_url)
            .query("_limit", &limit.to_string());
        let response = self.send(Operation::Load, request, None)?;
        let records: Vec<RemoteRecord> = Self::decode(Operation::Load, response)?;

        let mut tracks = Vec::with_capacity(records.len());
        for record in records.iter().take(limit) {
            match record.id {
                Some(id) => tracks.push(project(id, record)),
                None => warn!("load: skipping remote record without an id"),
            }
        }
        Ok(tracks)
    }

    fn create(&self, draft: &Draft) -> Result<Track, TransportError> {
        let payload = RemotePayload::from(draft);
        let request = self
            .http_client
            .post(&self.base_url)
            .set("Content-Type", "application/json");
        let response = self.send(Operation::Create, request, Some(&payload))?;
        let echo = Self::decode::<RemoteRecord>(Operation::Create, response)?;
        let merged = RemoteRecord::from(&payload).overlay(echo);
        // Some servers omit the id; a timestamp keeps the Track addressable
        // locally but is not guaranteed to be unique or known remotely.
        let id = merged.id.unwrap_or_else(synthesized_id);
        Ok(project(id, &merged))
    }

    fn update(&self, id: i64, draft: &Draft) -> Result<Track, TransportError> {
        let payload = RemotePayload::from(draft);
        let request = self
            .http_client
            .request("PATCH", &self.item_url(id))
            .set("Content-Type", "application/json");
        let response = self.send(Operation::Update, request, Some(&payload))?;
        let echo = Self::decode::<RemoteRecord>(Operation::Update, response)?;
        let merged = RemoteRecord::from(&payload).overlay(echo);
        Ok(project(id, &merged))
    }

    fn delete(&self, id: i64) -> Result<(), TransportError> {
        let request = self.http_client.delete(&self.item_url(id));
        self.send(Operation::Delete, request, None)?;
        Ok(())
    }
}

fn map_ureq_error(operation: Operation, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, _) => TransportError::Status { operation, status },
        ureq::Error::Transport(transport) => TransportError::Network {
            operation,
            message: transport.to_string(),
        },
    }
}

fn synthesized_id() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
