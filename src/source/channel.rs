//! Channel-based backend.
//!
//! Requests are forwarded to a [`ChannelHandle`] and completions are pushed
//! back by whoever holds it. This is how the dashboard is driven without a
//! network: tests script the server side, and embedders can bridge the
//! dashboard onto a transport of their own.

use tokio::sync::mpsc;

use super::{Backend, Completion, Request, RequestId, Response};
use crate::error::ApiError;

/// A backend whose requests are answered through a [`ChannelHandle`].
///
/// # Example
///
/// ```
/// use scanwatch::{Backend, ChannelBackend, Request, Response};
///
/// let (mut handle, mut backend) = ChannelBackend::create("scripted");
/// backend.dispatch(Request::ListHosts);
///
/// let (id, request) = handle.next_request().unwrap();
/// handle.respond(id, request, Ok(Response::Hosts(Vec::new())));
///
/// let completion = backend.poll().unwrap();
/// assert!(completion.result.is_ok());
/// ```
#[derive(Debug)]
pub struct ChannelBackend {
    requests: mpsc::UnboundedSender<(RequestId, Request)>,
    completions: mpsc::UnboundedReceiver<Completion>,
    description: String,
    next_id: RequestId,
}

/// The answering side of a [`ChannelBackend`].
#[derive(Debug)]
pub struct ChannelHandle {
    requests: mpsc::UnboundedReceiver<(RequestId, Request)>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl ChannelBackend {
    /// Create a connected handle/backend pair.
    ///
    /// `source_description` names where answers come from (shown in the header).
    pub fn create(source_description: &str) -> (ChannelHandle, Self) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let backend = Self {
            requests: request_tx,
            completions: completion_rx,
            description: format!("channel: {}", source_description),
            next_id: 1,
        };
        let handle = ChannelHandle {
            requests: request_rx,
            completions: completion_tx,
        };
        (handle, backend)
    }
}

impl Backend for ChannelBackend {
    fn dispatch(&mut self, request: Request) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        // A dropped handle just means nobody will answer.
        let _ = self.requests.send((id, request));
        id
    }

    fn poll(&mut self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl ChannelHandle {
    /// Take the next request the backend dispatched, if any.
    pub fn next_request(&mut self) -> Option<(RequestId, Request)> {
        self.requests.try_recv().ok()
    }

    /// Drain every request dispatched so far.
    pub fn pending_requests(&mut self) -> Vec<(RequestId, Request)> {
        let mut out = Vec::new();
        while let Some(r) = self.next_request() {
            out.push(r);
        }
        out
    }

    /// Complete a request. Returns `false` if the backend is gone.
    pub fn respond(
        &self,
        id: RequestId,
        request: Request,
        result: Result<Response, ApiError>,
    ) -> bool {
        self.completions
            .send(Completion {
                id,
                request,
                result,
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_assigns_increasing_ids() {
        let (mut handle, mut backend) = ChannelBackend::create("test");

        let first = backend.dispatch(Request::ListHosts);
        let second = backend.dispatch(Request::FetchHistory);
        assert!(second > first);

        let pending = handle.pending_requests();
        assert_eq!(
            pending,
            vec![(first, Request::ListHosts), (second, Request::FetchHistory)]
        );
        assert!(handle.next_request().is_none());
    }

    #[test]
    fn test_completions_arrive_in_response_order() {
        let (mut handle, mut backend) = ChannelBackend::create("test");

        backend.dispatch(Request::FetchHistory);
        backend.dispatch(Request::FetchHistory);
        let pending = handle.pending_requests();

        // Answer the newer request first.
        let (newer_id, newer_req) = pending[1].clone();
        let (older_id, older_req) = pending[0].clone();
        assert!(handle.respond(newer_id, newer_req, Err(ApiError::Timeout)));
        assert!(handle.respond(older_id, older_req, Err(ApiError::Timeout)));

        assert_eq!(backend.poll().map(|c| c.id), Some(newer_id));
        assert_eq!(backend.poll().map(|c| c.id), Some(older_id));
        assert!(backend.poll().is_none());
    }

    #[test]
    fn test_respond_after_backend_dropped() {
        let (handle, backend) = ChannelBackend::create("test");
        assert_eq!(backend.description(), "channel: test");
        drop(backend);
        assert!(!handle.respond(1, Request::ListHosts, Ok(Response::Hosts(Vec::new()))));
    }
}
