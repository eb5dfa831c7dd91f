use std::sync::Arc;

use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::api;
use crate::config::{ClientConfig, Language};
use crate::error::{self, Error};
use crate::singleflight::{Flight, SingleFlight};
use crate::storage::StorageScopes;

/// Field names the backend has been observed using for a freshly minted
/// access credential.
const TOKEN_FIELDS: &[&str] = &["token", "accessToken", "access_token"];
const REFRESH_FIELDS: &[&str] = &["refreshToken", "refresh_token"];

/// Authorized request layer for the Fahmaan backend.
///
/// Every outbound call carries `Accept-Language` and, once a session exists,
/// `Authorization: Bearer <token>`. A 401 on the first attempt triggers the
/// refresh-and-retry protocol: refresh is strictly single-flight, concurrent
/// callers queue on the in-flight refresh and are resolved in enqueue order
/// with its result. A failed refresh is session-fatal — both storage scopes
/// are cleared, every queued caller rejects with the same error, and the
/// [`session_expired`](ApiClient::session_expired) signal fires so the UI
/// can navigate back to its login screen.
///
/// Cheap to clone; clones share the connection pool, storage scopes, and
/// refresh coordination state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    scopes: StorageScopes,
    refresh: SingleFlight<Result<String, String>>,
    expired_tx: watch::Sender<bool>,
}

/// Request body, kept replayable so the original request can be redispatched
/// after a refresh (multipart forms are rebuilt per attempt).
pub(crate) enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

pub(crate) struct FormPart {
    pub(crate) name: String,
    pub(crate) value: PartValue,
}

pub(crate) enum PartValue {
    Text(String),
    File {
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl ApiClient {
    /// Create a client over the given configuration and storage scopes.
    #[must_use]
    pub fn new(config: ClientConfig, scopes: StorageScopes) -> Self {
        let (expired_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                config,
                scopes,
                refresh: SingleFlight::new(),
                expired_tx,
            }),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    /// Intended at construction time, before the client is cloned.
    #[must_use]
    pub fn with_http_client(self, client: reqwest::Client) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.http = client;
                inner
            }
            Err(shared) => ClientInner {
                http: client,
                config: shared.config.clone(),
                scopes: shared.scopes.clone(),
                refresh: SingleFlight::new(),
                expired_tx: shared.expired_tx.clone(),
            },
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The storage scopes holding session material.
    #[must_use]
    pub fn storage(&self) -> &StorageScopes {
        &self.inner.scopes
    }

    /// Receiver that flips to `true` when a refresh fails fatally and the
    /// session is cleared. UI layers watch this to return to their login
    /// screen; [`Session`](crate::session::Session) folds the signal into
    /// its own logged-in state.
    #[must_use]
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.inner.expired_tx.subscribe()
    }

    /// Reset the expiry signal; a new login supersedes the dead session.
    pub(crate) fn reset_session_expired(&self) {
        let _ = self.inner.expired_tx.send(false);
    }

    fn language(&self) -> Language {
        self.inner.config.language
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.inner
            .config
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid request path '{path}': {e}")))
    }

    // ── Request pipeline ───────────────────────────────────────────

    /// Dispatch a request with credential attachment and the 401-once
    /// refresh-and-retry protocol. All typed endpoint wrappers funnel
    /// through here.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        let token = self.inner.scopes.access_token();
        let response = self.dispatch(&method, &url, query, &body, token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // First attempt only: refresh and redispatch once. A 401 on the
            // retried request falls through read_json as a plain API error.
            let fresh = self.refresh_access_token().await?;
            let retried = self
                .dispatch(&method, &url, query, &body, Some(fresh))
                .await?;
            return self.read_json(retried).await;
        }

        self.read_json(response).await
    }

    /// Dispatch without the refresh protocol. The auth endpoints themselves
    /// go through here so a wrong-password 401 cannot cascade into a
    /// session-fatal refresh.
    pub(crate) async fn request_no_retry(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        let token = self.inner.scopes.access_token();
        let response = self.dispatch(&method, &url, &[], &body, token).await?;
        self.read_json(response).await
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, String)],
        body: &Body,
        token: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let mut request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT_LANGUAGE, self.language().as_str());

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Multipart(parts) => request.multipart(build_form(parts)?),
        };

        request.send().await.map_err(Into::into)
    }

    /// Read the response body as JSON, normalizing non-2xx statuses into
    /// [`Error::Api`]. Empty bodies become `Null`; non-JSON bodies are kept
    /// as raw strings rather than rejected.
    async fn read_json(&self, response: reqwest::Response) -> Result<Value, Error> {
        let status = response.status();
        let text = response.text().await?;
        let value = parse_lenient(&text);

        if status.is_success() {
            Ok(value)
        } else {
            Err(self.api_error(status.as_u16(), &value))
        }
    }

    /// Normalize a non-2xx body into a displayable message: the backend's own
    /// message where it supplies one (under any of its field spellings), else
    /// the fixed per-status message, else a generic fallback.
    fn api_error(&self, status: u16, body: &Value) -> Error {
        let message = api::string_field(
            body,
            &["message", "Message", "error", "errorMessage", "Error", "title"],
        )
        .or_else(|| error::status_message(self.language(), status).map(str::to_owned))
        .unwrap_or_else(|| error::generic_message(self.language()).to_owned());

        Error::Api { status, message }
    }

    // ── Refresh protocol ───────────────────────────────────────────

    /// Mint a new access credential, coordinating concurrent callers so only
    /// one refresh call is ever outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] if no refresh credential is present
    /// or the backend rejects it. The session is cleared before this returns;
    /// every queued caller receives the same error.
    pub async fn refresh_access_token(&self) -> Result<String, Error> {
        match self.inner.refresh.join() {
            Flight::Follower(rx) => match rx.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(message)) => Err(Error::SessionExpired(message)),
                // Leader dropped without settling (cancelled mid-refresh).
                Err(_) => Err(Error::SessionExpired("refresh abandoned".into())),
            },
            Flight::Leader => {
                let outcome = self.run_refresh().await;
                match outcome {
                    Ok(token) => {
                        self.inner.refresh.settle(Ok(token.clone()));
                        Ok(token)
                    }
                    Err(message) => {
                        self.expire_session();
                        self.inner.refresh.settle(Err(message.clone()));
                        Err(Error::SessionExpired(message))
                    }
                }
            }
        }
    }

    /// The leader's refresh call. Infallible control flow by construction:
    /// every path returns, so the caller always settles the flight.
    async fn run_refresh(&self) -> Result<String, String> {
        let Some(refresh_token) = self.inner.scopes.refresh_token() else {
            return Err("no refresh credential".into());
        };

        let url = self
            .url(&format!("/auth/refresh-token/{refresh_token}"))
            .map_err(|e| e.to_string())?;
        let response = self
            .inner
            .http
            .post(url)
            .header(ACCEPT_LANGUAGE, self.language().as_str())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;
        let body = parse_lenient(&text);

        if !status.is_success() {
            return Err(format!("refresh rejected with status {}", status.as_u16()));
        }

        let payload = api::payload(&body);
        let token = api::string_field(payload, TOKEN_FIELDS)
            .ok_or_else(|| "no new access credential returned".to_owned())?;
        let rotated = api::string_field(payload, REFRESH_FIELDS);

        self.inner.scopes.store_refreshed(&token, rotated.as_deref());
        tracing::debug!(rotated = rotated.is_some(), "access credential refreshed");
        Ok(token)
    }

    fn expire_session(&self) {
        self.inner.scopes.clear_all();
        let _ = self.inner.expired_tx.send(true);
        tracing::warn!("refresh failed; session cleared, re-authentication required");
    }

    // ── Auth endpoints (bypass the retry protocol) ─────────────────

    /// Exchange identifier and secret for credentials plus identity.
    /// The field spelling `Identifer` is the backend's, not a typo here.
    pub(crate) async fn login_raw(&self, identifier: &str, secret: &str) -> Result<Value, Error> {
        self.request_no_retry(
            Method::POST,
            "/auth/login",
            Body::Json(serde_json::json!({
                "Identifer": identifier,
                "password": secret,
            })),
        )
        .await
    }

    /// Verify the current access credential and fetch the caller's identity.
    pub async fn user_info(&self) -> Result<Value, Error> {
        self.request(Method::GET, "/Auth/GetUserInfo", &[], Body::Empty)
            .await
    }

    /// Invalidate a refresh credential server-side.
    pub(crate) async fn logout_raw(&self, refresh_token: &str) -> Result<Value, Error> {
        self.request_no_retry(
            Method::POST,
            &format!("/auth/logout/{refresh_token}"),
            Body::Empty,
        )
        .await
    }
}

fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, Error> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match &part.value {
            PartValue::Text(text) => form.text(part.name.clone(), text.clone()),
            PartValue::File {
                filename,
                content_type,
                bytes,
            } => {
                let file = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(filename.clone())
                    .mime_str(content_type)?;
                form.part(part.name.clone(), file)
            }
        };
    }
    Ok(form)
}

fn parse_lenient(text: &str) -> Value {
    if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ApiClient {
        ApiClient::new(ClientConfig::new(), StorageScopes::in_memory())
    }

    #[test]
    fn parse_lenient_shapes() {
        assert_eq!(parse_lenient(""), Value::Null);
        assert_eq!(parse_lenient("  "), Value::Null);
        assert_eq!(parse_lenient("{\"a\":1}"), serde_json::json!({"a": 1}));
        assert_eq!(parse_lenient("plain text"), Value::String("plain text".into()));
    }

    #[test]
    fn api_error_prefers_backend_message() {
        let client = test_client();
        let err = client.api_error(400, &serde_json::json!({"Message": "bad title"}));
        assert_eq!(err.display_message(), "bad title");
    }

    #[test]
    fn api_error_falls_back_to_status_table_then_generic() {
        let client = test_client();
        // 404 has a fixed message in the default (Arabic) table.
        let err = client.api_error(404, &Value::Null);
        assert_eq!(err.display_message(), "الرابط غير موجود");
        // 418 does not; generic fallback.
        let err = client.api_error(418, &Value::Null);
        assert_eq!(err.display_message(), "حدث خطأ ما");
    }

    #[test]
    fn url_joins_against_base() {
        let client = test_client();
        assert_eq!(
            client.url("/api/Article").unwrap().as_str(),
            "http://fahmaan.runasp.net/api/Article"
        );
    }
}
