//! HTTP backend using the scanner's REST API.
//!
//! [`ApiClient`] is a thin async wrapper around the endpoints. It is used
//! directly by the non-interactive export mode. [`HttpBackend`] spawns each
//! request onto a tokio runtime and queues the outcome for the UI loop.

use std::time::Duration;

use reqwest::{Client, Method, Response as HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    ActionResponse, Backend, Completion, HistoryPayload, HostRecord, KnownBody, Request,
    RequestId, Response, UpdateFieldBody,
};
use crate::data::EditableField;
use crate::error::ApiError;

/// Async client for the scanner API.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use scanwatch::ApiClient;
///
/// # tokio_test::block_on(async {
/// let client = ApiClient::new("http://127.0.0.1:5000", Duration::from_secs(10)).unwrap();
/// let history = client.fetch_history().await.unwrap();
/// println!("{} hosts with history", history.len());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a [`Request`] and shape its body by endpoint.
    pub async fn execute(&self, request: &Request) -> Result<Response, ApiError> {
        match request {
            Request::ListHosts => self.list_hosts().await.map(Response::Hosts),
            Request::FetchHistory => self.fetch_history().await.map(Response::History),
            Request::UpdateField { ip, field, value } => {
                self.update_field(ip, *field, value).await.map(Response::Action)
            }
            Request::SetKnown { ip, known } => {
                self.set_known(ip, *known).await.map(Response::Action)
            }
            Request::DeleteHost { ip } => self.delete_host(ip).await.map(Response::Action),
            Request::DeleteHistory { ip } => self.delete_history(ip).await.map(Response::Action),
            Request::DeleteAllHistory => self.delete_all_history().await.map(Response::Action),
        }
    }

    /// `GET /api/hosts`. The body must be a JSON array.
    pub async fn list_hosts(&self) -> Result<Vec<HostRecord>, ApiError> {
        let body = self.send(Method::GET, "/api/hosts", None).await?;
        match body {
            Value::Array(_) => decode(body),
            Value::Object(ref map) => match map.get("error").and_then(Value::as_str) {
                Some(err) => Err(ApiError::Rejected(err.to_string())),
                None => Err(ApiError::Malformed("expected an array of hosts".into())),
            },
            _ => Err(ApiError::Malformed("expected an array of hosts".into())),
        }
    }

    /// `GET /api/history`. The body must be a JSON object keyed by host.
    pub async fn fetch_history(&self) -> Result<HistoryPayload, ApiError> {
        let body = self.send(Method::GET, "/api/history", None).await?;
        match body {
            Value::Object(ref map) => {
                if let Some(err) = map.get("error").and_then(Value::as_str) {
                    return Err(ApiError::Rejected(err.to_string()));
                }
                decode(body)
            }
            _ => Err(ApiError::Malformed("expected a mapping of host histories".into())),
        }
    }

    /// `POST /api/hosts/{ip}/update`. Requires `success: true` in the body.
    pub async fn update_field(
        &self,
        ip: &str,
        field: EditableField,
        value: &str,
    ) -> Result<ActionResponse, ApiError> {
        let body = UpdateFieldBody {
            field: field.as_str().to_string(),
            value: value.to_string(),
        };
        let path = format!("/api/hosts/{}/update", ip);
        let resp: ActionResponse =
            decode(self.send(Method::POST, &path, Some(serde_json::to_value(body)?)).await?)?;
        require_success(resp)
    }

    /// `POST /api/hosts/{ip}/known`. Requires `success: true` in the body.
    pub async fn set_known(&self, ip: &str, known: bool) -> Result<ActionResponse, ApiError> {
        let body = KnownBody {
            known: u8::from(known),
        };
        let path = format!("/api/hosts/{}/known", ip);
        let resp: ActionResponse =
            decode(self.send(Method::POST, &path, Some(serde_json::to_value(body)?)).await?)?;
        require_success(resp)
    }

    /// `DELETE /api/hosts/{ip}`.
    pub async fn delete_host(&self, ip: &str) -> Result<ActionResponse, ApiError> {
        let path = format!("/api/hosts/{}", ip);
        decode(self.send(Method::DELETE, &path, None).await?)
    }

    /// `DELETE /api/history/{ip}`.
    pub async fn delete_history(&self, ip: &str) -> Result<ActionResponse, ApiError> {
        let path = format!("/api/history/{}", ip);
        decode(self.send(Method::DELETE, &path, None).await?)
    }

    /// `DELETE /api/history/all`.
    pub async fn delete_all_history(&self) -> Result<ActionResponse, ApiError> {
        decode(self.send(Method::DELETE, "/api/history/all", None).await?)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;
        read_json(response).await
    }
}

/// Read a response body as JSON, mapping non-2xx statuses to
/// [`ApiError::Http`] with the server's `error` field when present.
async fn read_json(response: HttpResponse) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let server_message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
        return Err(ApiError::from_status(status.as_u16(), server_message));
    }

    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn require_success(resp: ActionResponse) -> Result<ActionResponse, ApiError> {
    if resp.success {
        Ok(resp)
    } else {
        let message = resp
            .error
            .clone()
            .unwrap_or_else(|| "server did not confirm the change".to_string());
        Err(ApiError::Rejected(message))
    }
}

/// A backend that sends requests over HTTP on a tokio runtime.
///
/// Each dispatched request becomes its own task; nothing serializes them.
/// A slow fetch and a fast one can be in flight together and their
/// completions are queued in resolution order.
#[derive(Debug)]
pub struct HttpBackend {
    client: ApiClient,
    runtime: Handle,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    description: String,
    next_id: RequestId,
}

impl HttpBackend {
    /// Create a backend that spawns its requests on `runtime`.
    pub fn new(client: ApiClient, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let description = format!("api: {}", client.base_url());
        Self {
            client,
            runtime,
            sender,
            receiver,
            description,
            next_id: 1,
        }
    }
}

impl Backend for HttpBackend {
    fn dispatch(&mut self, request: Request) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;

        let client = self.client.clone();
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = client.execute(&request).await;
            if let Err(ref e) = result {
                warn!("{} failed: {}", request, e);
            }
            // The receiver only goes away when the app shuts down.
            let _ = sender.send(Completion {
                id,
                request,
                result,
            });
        });

        id
    }

    fn poll(&mut self) -> Option<Completion> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_hosts_parses_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/hosts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"ip_address": "10.0.0.1", "status": "ONLINE", "known_host": 1}]"#)
            .create_async()
            .await;

        let hosts = client_for(&server).list_hosts().await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].ip_address, "10.0.0.1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_hosts_rejects_non_array() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/hosts")
            .with_status(200)
            .with_body(r#"{"hosts": []}"#)
            .create_async()
            .await;

        let err = client_for(&server).list_hosts().await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_list_hosts_surfaces_error_field_in_ok_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/hosts")
            .with_status(200)
            .with_body(r#"{"error": "Database connection failed"}"#)
            .create_async()
            .await;

        let err = client_for(&server).list_hosts().await.unwrap_err();
        assert_eq!(err.to_string(), "API Error: Database connection failed");
    }

    #[tokio::test]
    async fn test_fetch_history_rejects_array() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/history")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = client_for(&server).fetch_history().await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_non_2xx_uses_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/history")
            .with_status(500)
            .with_body(r#"{"error": "Query error: table missing"}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_history().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Query error: table missing");
    }

    #[tokio::test]
    async fn test_non_2xx_without_error_field_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/hosts/10.0.0.1")
            .with_status(503)
            .with_body("<html>unavailable</html>")
            .create_async()
            .await;

        let err = client_for(&server).delete_host("10.0.0.1").await.unwrap_err();
        assert_eq!(err.to_string(), "Server error 503");
    }

    #[tokio::test]
    async fn test_update_field_sends_body_and_requires_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/hosts/10.0.0.7/update")
            .match_body(Matcher::Json(serde_json::json!({"field": "note", "value": "printer"})))
            .with_status(200)
            .with_body(r#"{"success": true, "field": "note"}"#)
            .create_async()
            .await;

        let resp = client_for(&server)
            .update_field("10.0.0.7", EditableField::Note, "printer")
            .await
            .unwrap();
        assert!(resp.success);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_known_without_success_flag_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/hosts/10.0.0.7/known")
            .match_body(Matcher::Json(serde_json::json!({"known": 1})))
            .with_status(200)
            .with_body(r#"{"success": false}"#)
            .create_async()
            .await;

        let err = client_for(&server).set_known("10.0.0.7", true).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_all_history_returns_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/history/all")
            .with_status(200)
            .with_body(r#"{"success": true, "message": "Deleted 42 history entries."}"#)
            .create_async()
            .await;

        let resp = client_for(&server).delete_all_history().await.unwrap();
        assert_eq!(resp.message.as_deref(), Some("Deleted 42 history entries."));
    }

    #[tokio::test]
    async fn test_http_backend_delivers_completion() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/history")
            .with_status(200)
            .with_body(r#"{"10.0.0.1": {"hostname": "gw", "events": []}}"#)
            .create_async()
            .await;

        let mut backend = HttpBackend::new(client_for(&server), Handle::current());
        let id = backend.dispatch(Request::FetchHistory);

        let completion = loop {
            if let Some(c) = backend.poll() {
                break c;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };

        assert_eq!(completion.id, id);
        assert_eq!(completion.request, Request::FetchHistory);
        match completion.result.unwrap() {
            Response::History(payload) => assert!(payload.contains_key("10.0.0.1")),
            other => panic!("unexpected response: {:?}", other),
        }
        assert!(backend.description().starts_with("api: http://"));
    }
}
