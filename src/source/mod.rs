//! Backend abstraction for talking to the scanner API.
//!
//! The UI loop never awaits a request. It hands a [`Request`] to a
//! [`Backend`], keeps drawing, and drains [`Completion`]s with
//! [`Backend::poll`] on every tick. Completions are applied in the order
//! they arrive, so when two fetches overlap the one that resolves last
//! wins.

mod channel;
mod http;
mod wire;

pub use channel::{ChannelBackend, ChannelHandle};
pub use http::{ApiClient, HttpBackend};
pub use wire::{
    ActionResponse, EventPayload, HistoryPayload, HostHistoryPayload, HostRecord, KnownBody,
    UpdateFieldBody,
};

use std::fmt::{self, Debug};

use crate::data::EditableField;
use crate::error::ApiError;

/// Identifier handed out by [`Backend::dispatch`], unique per backend.
pub type RequestId = u64;

/// A call to one of the backend's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `GET /api/hosts`
    ListHosts,
    /// `GET /api/history`
    FetchHistory,
    /// `POST /api/hosts/{ip}/update`
    UpdateField {
        ip: String,
        field: EditableField,
        value: String,
    },
    /// `POST /api/hosts/{ip}/known`
    SetKnown { ip: String, known: bool },
    /// `DELETE /api/hosts/{ip}`
    DeleteHost { ip: String },
    /// `DELETE /api/history/{ip}`
    DeleteHistory { ip: String },
    /// `DELETE /api/history/all`
    DeleteAllHistory,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::ListHosts => write!(f, "GET /api/hosts"),
            Request::FetchHistory => write!(f, "GET /api/history"),
            Request::UpdateField { ip, field, .. } => {
                write!(f, "POST /api/hosts/{}/update ({})", ip, field.as_str())
            }
            Request::SetKnown { ip, known } => {
                write!(f, "POST /api/hosts/{}/known ({})", ip, u8::from(*known))
            }
            Request::DeleteHost { ip } => write!(f, "DELETE /api/hosts/{}", ip),
            Request::DeleteHistory { ip } => write!(f, "DELETE /api/history/{}", ip),
            Request::DeleteAllHistory => write!(f, "DELETE /api/history/all"),
        }
    }
}

/// Successful body of a request, shaped by endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Hosts(Vec<HostRecord>),
    History(HistoryPayload),
    Action(ActionResponse),
}

/// The outcome of a dispatched request.
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: RequestId,
    pub request: Request,
    pub result: Result<Response, ApiError>,
}

/// Trait for dispatching requests to the scanner backend.
///
/// Implementations run requests in the background and make their
/// outcomes available through [`poll`](Backend::poll).
///
/// # Example
///
/// ```
/// use scanwatch::{Backend, ChannelBackend, Request};
///
/// let (mut handle, mut backend) = ChannelBackend::create("test");
/// let id = backend.dispatch(Request::FetchHistory);
/// assert_eq!(handle.next_request().map(|(i, _)| i), Some(id));
/// assert!(backend.poll().is_none());
/// ```
pub trait Backend: Send + Debug {
    /// Start a request. Must not block.
    fn dispatch(&mut self, request: Request) -> RequestId;

    /// Take the next finished request, if any. Must not block.
    fn poll(&mut self) -> Option<Completion>;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}
