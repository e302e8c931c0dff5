//! Best-effort delivery of local edits to the remote write endpoint
use crate::location::{Location, LocationId};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Full field set of a record, named after the spreadsheet columns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordPayload {
    #[serde(rename = "ID")]
    pub id: LocationId,
    #[serde(rename = "Location")]
    pub name: String,
    pub hub: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub viability: String,
    pub notes: String,
    #[serde(rename = "ExpectingLoad")]
    pub expecting: String,
    pub driver: String,
}

impl From<&Location> for RecordPayload {
    fn from(loc: &Location) -> Self {
        Self {
            id: loc.id,
            name: loc.name.clone(),
            hub: loc.hub.clone(),
            address: loc.address.clone(),
            lat: loc.lat,
            lng: loc.lng,
            viability: loc.viability.clone(),
            notes: loc.notes.clone(),
            expecting: loc.expecting.clone(),
            driver: loc.driver.clone(),
        }
    }
}

/// A single request body for the write endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum WriteRequest {
    Create(RecordPayload),
    Update(RecordPayload),
    Delete {
        #[serde(rename = "ID")]
        id: LocationId,
    },
}

impl WriteRequest {
    pub fn id(&self) -> LocationId {
        match self {
            WriteRequest::Create(p) | WriteRequest::Update(p) => p.id,
            WriteRequest::Delete { id } => *id,
        }
    }
}

/// Somewhere local edits are reported to. Nothing waits on the outcome: local state has already
/// changed by the time a request is sent and is never rolled back.
pub trait WriteSink {
    fn send(&self, request: WriteRequest);

    fn notify_create(&self, location: &Location) {
        self.send(WriteRequest::Create(location.into()))
    }

    fn notify_update(&self, location: &Location) {
        self.send(WriteRequest::Update(location.into()))
    }

    fn notify_delete(&self, id: LocationId) {
        self.send(WriteRequest::Delete { id })
    }
}

/// A sink that only logs what would have been sent
#[derive(Debug, Default)]
pub struct LogSink;

impl WriteSink for LogSink {
    fn send(&self, request: WriteRequest) {
        match serde_json::to_string(&request) {
            Ok(body) => info!(%body, "not sending write request"),
            Err(e) => warn!(?e, "unable to serialize write request"),
        }
    }
}

/// Posts each request as json to the write endpoint on a background task. Failures are logged
/// and otherwise ignored.
#[derive(Debug)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            pending: Default::default(),
        }
    }

    /// Wait for every request sent so far to finish, successfully or not
    pub async fn flush(&self) {
        let pending = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        debug!(count = pending.len(), "waiting for write requests");
        for res in join_all(pending).await {
            if let Err(e) = res {
                warn!(?e, "write request task failed");
            }
        }
    }
}

impl WriteSink for HttpSink {
    fn send(&self, request: WriteRequest) {
        let client = self.client.clone();
        let url = self.url.clone();
        debug!(?request, %url, "sending write request");
        let handle = tokio::spawn(async move {
            let id = request.id();
            match client.post(&url).json(&request).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    warn!(id, status = %resp.status(), "write request was rejected")
                }
                Ok(_) => debug!(id, "write request delivered"),
                Err(e) => warn!(id, ?e, "write request failed"),
            }
        });
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|h| !h.is_finished());
                pending.push(handle);
            }
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }
}
