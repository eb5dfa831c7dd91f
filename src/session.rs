use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{self, UserId};
use crate::client::ApiClient;
use crate::error::{self, Error};
use crate::storage::keys;

/// Staff role tag.
///
/// Unknown tags are preserved verbatim rather than rejected — role
/// vocabulary is owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Lawyer,
    User,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "lawyer" => Self::Lawyer,
            "user" => Self::User,
            _ => Self::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "Admin".into(),
            Role::Lawyer => "Lawyer".into(),
            Role::User => "User".into(),
            Role::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("Admin"),
            Self::Lawyer => f.write_str("Lawyer"),
            Self::User => f.write_str("User"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl Role {
    /// Role tags from an identity object: the backend sends them as a single
    /// string or an array, under several spellings. Missing role data means
    /// no elevated role — never assumed, only verified.
    pub(crate) fn from_identity(value: &Value) -> Vec<Role> {
        let Some(raw) = api::field(value, &["role", "userRole", "Role", "roles", "Roles"]) else {
            return Vec::new();
        };
        match raw {
            Value::String(s) => vec![Role::from(s.clone())],
            Value::Array(arr) => arr
                .iter()
                .filter_map(api::scalar_string)
                .map(Role::from)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Authenticated identity snapshot: captured at login or session-restore
/// time, persisted alongside the credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    /// Derive a principal from a backend identity object, tolerating the
    /// field-name variants the backend has been observed emitting.
    /// `fallback` (the login identifier) stands in for missing email/name.
    pub(crate) fn from_identity(value: &Value, fallback: Option<&str>) -> Self {
        let email = api::string_field(value, &["email", "Email", "userName"])
            .or_else(|| fallback.map(ToOwned::to_owned));
        let name = api::string_field(value, &["name", "userName", "Name"])
            .or_else(|| email.clone())
            .unwrap_or_default();
        let id = api::string_field(value, &["id", "userId", "Id", "_id"])
            .or_else(|| email.clone())
            .unwrap_or_else(|| "unknown".into());

        Self {
            id: UserId(id),
            name,
            email,
            roles: Role::from_identity(value),
        }
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    #[must_use]
    pub fn is_lawyer(&self) -> bool {
        self.has_role(&Role::Lawyer)
    }
}

/// Result of a login attempt. Never an `Err`: all backend error shapes are
/// normalized into a displayable message at this boundary.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LoginOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub principal: Option<Principal>,
}

impl LoginOutcome {
    fn succeeded(principal: Principal) -> Self {
        Self {
            success: true,
            message: None,
            principal: Some(principal),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            principal: None,
        }
    }
}

#[derive(Default)]
struct SessionState {
    logged_in: bool,
    auth_checked: bool,
    principal: Option<Principal>,
}

/// The session store: owns the authenticated state and its lifecycle
/// (`restore`, `login`, `logout`, `clear`) over the shared [`ApiClient`]
/// and its storage scopes.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// The underlying request layer.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Whether a session is live. A fatal refresh failure reads as logged
    /// out immediately, without waiting for the embedder to observe
    /// [`session_expired`](ApiClient::session_expired).
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.sync_expiry();
        self.state.lock().expect("session lock poisoned").logged_in
    }

    /// Whether the startup auth check has completed. UI layers show a
    /// loading state until this flips.
    #[must_use]
    pub fn auth_checked(&self) -> bool {
        self.state.lock().expect("session lock poisoned").auth_checked
    }

    /// Current principal, if logged in.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.sync_expiry();
        self.state
            .lock()
            .expect("session lock poisoned")
            .principal
            .clone()
    }

    /// Rehydrate a persisted session at startup.
    ///
    /// Reads credentials from whichever scope holds them, verifies the access
    /// credential against the backend, and falls back to the persisted
    /// identity snapshot when verification is unreachable — a deliberate
    /// offline tolerance. Always flips [`auth_checked`](Session::auth_checked)
    /// before returning.
    pub async fn restore(&self) {
        let scopes = self.client.storage();
        let token = scopes.restore_value(keys::TOKEN);
        let snapshot = scopes.restore_value(keys::USER);

        if token.is_none() {
            self.finish_check();
            return;
        }

        match self.client.user_info().await {
            Ok(response) => {
                let success = api::bool_field(&response, &["success", "Success"]).unwrap_or(true);
                if !success {
                    // Credential rejected outright: stale session.
                    self.clear();
                    self.finish_check();
                    return;
                }
                let identity = api::field(&response, &["user", "User", "data"])
                    .cloned()
                    .or_else(|| parse_snapshot(snapshot.as_deref()))
                    .unwrap_or(Value::Null);
                self.set_logged_in(Principal::from_identity(&identity, None));
            }
            Err(e) => {
                tracing::warn!(error = %e, "session verification unreachable");
                match parse_snapshot(snapshot.as_deref()) {
                    // Roles come strictly from the snapshot here; missing
                    // role data stays missing until verified.
                    Some(identity) => {
                        self.set_logged_in(Principal::from_identity(&identity, None));
                    }
                    None => self.clear(),
                }
            }
        }

        self.finish_check();
    }

    /// Authenticate with the backend and persist the session into the scope
    /// selected by `remember`.
    pub async fn login(&self, identifier: &str, secret: &str, remember: bool) -> LoginOutcome {
        let response = match self.client.login_raw(identifier, secret).await {
            Ok(response) => response,
            Err(e) => return LoginOutcome::failed(self.login_message(&e)),
        };

        let data = api::payload(&response);
        let Some(token) = api::string_field(data, &["token", "accessToken", "access_token"])
        else {
            tracing::warn!("login response carried no access credential");
            return LoginOutcome::failed(
                error::generic_message(self.client.config().language()).to_owned(),
            );
        };
        let refresh = api::string_field(data, &["refreshToken", "refresh_token"]);

        let identity = api::field(data, &["user", "User"])
            .cloned()
            .unwrap_or_else(|| data.clone());
        let snapshot = if identity.is_object() {
            identity.to_string()
        } else {
            serde_json::json!({ "id": identifier }).to_string()
        };

        self.client
            .storage()
            .store_login(remember, &token, refresh.as_deref(), &snapshot);

        let principal = Principal::from_identity(&identity, Some(identifier));
        tracing::info!(user = %principal.id, remember, "login successful");
        self.set_logged_in(principal.clone());
        LoginOutcome::succeeded(principal)
    }

    /// End the session. The backend call is best-effort; both storage scopes
    /// and the in-memory state are cleared unconditionally, so logout never
    /// fails and is safe to call twice.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.client.storage().refresh_token() {
            if let Err(e) = self.client.logout_raw(&refresh_token).await {
                tracing::debug!(error = %e, "backend logout failed; clearing locally");
            }
        }
        self.clear();
        tracing::info!("logged out");
    }

    /// Wipe both storage scopes and reset the in-memory session to
    /// logged-out defaults.
    pub fn clear(&self) {
        self.client.storage().clear_all();
        let mut state = self.state.lock().expect("session lock poisoned");
        state.logged_in = false;
        state.principal = None;
    }

    fn set_logged_in(&self, principal: Principal) {
        self.client.reset_session_expired();
        let mut state = self.state.lock().expect("session lock poisoned");
        state.logged_in = true;
        state.principal = Some(principal);
    }

    /// Fold a fatal refresh failure into the in-memory state. The client has
    /// already wiped both storage scopes; this drops the stale principal the
    /// next time anyone asks.
    fn sync_expiry(&self) {
        if *self.client.session_expired().borrow() {
            let mut state = self.state.lock().expect("session lock poisoned");
            state.logged_in = false;
            state.principal = None;
        }
    }

    fn finish_check(&self) {
        self.state.lock().expect("session lock poisoned").auth_checked = true;
    }

    /// Login failures surface a displayable message: the normalized backend
    /// message for API errors, a generic one for transport faults.
    fn login_message(&self, error: &Error) -> String {
        match error {
            Error::Api { .. } | Error::SessionExpired(_) => error.display_message(),
            _ => error::generic_message(self.client.config().language()).to_owned(),
        }
    }
}

fn parse_snapshot(snapshot: Option<&str>) -> Option<Value> {
    let value: Value = serde_json::from_str(snapshot?).ok()?;
    value.is_object().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::from("admin".to_owned()), Role::Admin);
        assert_eq!(Role::from("ADMIN".to_owned()), Role::Admin);
        assert_eq!(Role::from("Lawyer".to_owned()), Role::Lawyer);
        assert_eq!(
            Role::from("moderator".to_owned()),
            Role::Other("moderator".into())
        );
    }

    #[test]
    fn roles_from_string_or_array() {
        assert_eq!(
            Role::from_identity(&json!({"role": "Admin"})),
            vec![Role::Admin]
        );
        assert_eq!(
            Role::from_identity(&json!({"Role": ["Admin", "lawyer"]})),
            vec![Role::Admin, Role::Lawyer]
        );
        assert_eq!(Role::from_identity(&json!({"role": 3})), Vec::<Role>::new());
    }

    #[test]
    fn missing_roles_mean_no_elevated_role() {
        // The old console forced Admin when restoring from a cached snapshot.
        // Roles must come strictly from the identity data.
        let principal = Principal::from_identity(&json!({"id": "u1", "name": "Huda"}), None);
        assert!(principal.roles.is_empty());
        assert!(!principal.is_admin());
    }

    #[test]
    fn principal_field_variants() {
        let p = Principal::from_identity(
            &json!({"userId": "u2", "userName": "omar@fahmaan.com", "Role": "Lawyer"}),
            None,
        );
        assert_eq!(p.id, UserId::from("u2"));
        assert_eq!(p.name, "omar@fahmaan.com");
        assert_eq!(p.email.as_deref(), Some("omar@fahmaan.com"));
        assert!(p.is_lawyer());
    }

    #[test]
    fn principal_falls_back_to_identifier() {
        let p = Principal::from_identity(&json!({}), Some("admin@fahmaan.com"));
        assert_eq!(p.id, UserId::from("admin@fahmaan.com"));
        assert_eq!(p.email.as_deref(), Some("admin@fahmaan.com"));
    }

    #[test]
    fn snapshot_must_be_a_json_object() {
        assert!(parse_snapshot(Some("{\"id\":\"u1\"}")).is_some());
        assert!(parse_snapshot(Some("not json")).is_none());
        assert!(parse_snapshot(Some("42")).is_none());
        assert!(parse_snapshot(None).is_none());
    }

    #[test]
    fn role_serde_roundtrip() {
        let json = serde_json::to_string(&Role::Lawyer).unwrap();
        assert_eq!(json, "\"Lawyer\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
