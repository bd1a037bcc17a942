//! Session state for the QHSE client
//!
//! This crate holds the authoritative, subscribable record of who is signed in.
//! The store never performs I/O: persisting credentials is the caller's job.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

/// Signed-in user profile as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub contact: Option<String>,
    #[serde(default)]
    pub is_active: Option<Value>,
}

impl UserProfile {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            email: None,
            contact: None,
            is_active: None,
        }
    }

    /// The backend sends `is_active` as a bool or as 0/1.
    pub fn active(&self) -> bool {
        match &self.is_active {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Snapshot of site-level safety counters
///
/// Kept as the raw name/value map the backend returns so that a replacement
/// never silently invents fields. Numeric accessors accept numbers and
/// numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardStats(BTreeMap<String, Value>);

impl DashboardStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn incidents(&self) -> Option<i64> {
        self.counter("incidents")
    }

    pub fn sors(&self) -> Option<i64> {
        self.counter("sors")
    }

    pub fn permits(&self) -> Option<i64> {
        self.counter("permits")
    }

    pub fn personnel(&self) -> Option<i64> {
        self.counter("personells")
    }

    pub fn tasks(&self) -> Option<i64> {
        self.counter("tasks")
    }

    pub fn icas(&self) -> Option<i64> {
        self.counter("icas")
    }

    pub fn environmental_concerns(&self) -> Option<i64> {
        self.counter("environmental_concerns")
    }

    /// Role fields (`supervisor`, `fire_marshal`, `first_aider`) rendered for display
    pub fn role(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which top-level navigator a front end may mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    /// Bootstrap has not finished; mount neither navigator
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub dashboard_stats: Option<DashboardStats>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
            token: None,
            dashboard_stats: None,
        }
    }
}

impl Session {
    pub fn stack(&self) -> Stack {
        if self.is_loading {
            Stack::Loading
        } else if self.is_authenticated {
            Stack::Authenticated
        } else {
            Stack::Unauthenticated
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.is_loading
    }
}

/// A named state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Login { user: UserProfile, token: String },
    Logout,
    SetLoading(bool),
    SetDashboardStats(DashboardStats),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "login",
            Action::Logout => "logout",
            Action::SetLoading(_) => "set_loading",
            Action::SetDashboardStats(_) => "set_dashboard_stats",
        }
    }
}

/// Applies an action to a session, returning the next session.
pub fn reduce(state: &Session, action: Action) -> Session {
    match action {
        Action::Login { user, token } => Session {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
            token: Some(token),
            dashboard_stats: state.dashboard_stats.clone(),
        },
        Action::Logout => Session {
            is_authenticated: false,
            is_loading: state.is_loading,
            user: None,
            token: None,
            dashboard_stats: None,
        },
        Action::SetLoading(flag) => Session {
            is_loading: flag,
            ..state.clone()
        },
        // Replace, never merge: fields missing from `stats` are dropped.
        Action::SetDashboardStats(stats) => Session {
            dashboard_stats: Some(stats),
            ..state.clone()
        },
    }
}

/// Shared holder of the session, mutated only through [`Action`]s
///
/// Every dispatch replaces the whole state under one write lock and then
/// broadcasts the new state to all subscribers.
pub struct SessionStore {
    state: RwLock<Session>,
    changes: broadcast::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store in the initial `loading` shape
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            state: RwLock::new(Session::default()),
            changes,
        }
    }

    pub fn dispatch(&self, action: Action) -> Session {
        let name = action.name();
        let next = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let next = reduce(&state, action);
            *state = next.clone();
            next
        };
        self.publish(name, next)
    }

    /// Logs out only if currently authenticated, as one step under the lock.
    ///
    /// Returns `None` when the session was already signed out, so concurrent
    /// callers racing to end the same session see exactly one `Some`.
    pub fn end_session(&self) -> Option<Session> {
        let next = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if !state.is_authenticated {
                return None;
            }
            let next = reduce(&state, Action::Logout);
            *state = next.clone();
            next
        };
        Some(self.publish("logout", next))
    }

    fn publish(&self, name: &str, next: Session) -> Session {
        debug!(
            "session action {} -> authenticated={} loading={}",
            name, next.is_authenticated, next.is_loading
        );
        if self.changes.send(next.clone()).is_err() {
            trace!("session action {} had no subscribers", name);
        }
        next
    }

    /// Caller guarantees both arguments are valid
    pub fn login(&self, user: UserProfile, token: impl Into<String>) -> Session {
        self.dispatch(Action::Login {
            user,
            token: token.into(),
        })
    }

    pub fn logout(&self) -> Session {
        self.dispatch(Action::Logout)
    }

    /// Gates the top-level navigator only; screens keep their own loading flags.
    pub fn set_loading(&self, flag: bool) -> Session {
        self.dispatch(Action::SetLoading(flag))
    }

    pub fn set_dashboard_stats(&self, stats: DashboardStats) -> Session {
        self.dispatch(Action::SetDashboardStats(stats))
    }

    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stack(&self) -> Stack {
        self.snapshot().stack()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Resolves once bootstrap has cleared the loading flag.
    pub async fn wait_until_ready(&self) -> Session {
        let mut changes = self.subscribe();
        loop {
            let current = self.snapshot();
            if current.is_ready() {
                return current;
            }
            match changes.recv().await {
                Ok(next) if next.is_ready() => return next,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return self.snapshot(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jo() -> UserProfile {
        UserProfile::new(1, "Jo")
    }

    #[test]
    fn initial_state_is_loading_and_signed_out() {
        let store = SessionStore::new();
        let state = store.snapshot();
        assert!(state.is_loading);
        assert!(!state.is_authenticated);
        assert_eq!(state.stack(), Stack::Loading);
    }

    #[test]
    fn login_sets_user_and_token() {
        let store = SessionStore::new();
        let state = store.login(jo(), "abc");
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.token.as_deref(), Some("abc"));
        assert_eq!(state.user, Some(jo()));
        assert_eq!(state.stack(), Stack::Authenticated);
    }

    #[test]
    fn logout_after_logins_restores_signed_out_shape() {
        let store = SessionStore::new();
        store.login(jo(), "abc");
        store.set_dashboard_stats(DashboardStats::new().with("incidents", 4));
        store.login(UserProfile::new(2, "Sam"), "def");
        let state = store.logout();
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
        assert_eq!(state.token, None);
        assert_eq!(state.dashboard_stats, None);

        let again = store.logout();
        assert_eq!(state, again);
    }

    #[test]
    fn dashboard_stats_are_replaced_not_merged() {
        let store = SessionStore::new();
        store.set_dashboard_stats(DashboardStats::new().with("a", 1));
        let state = store.set_dashboard_stats(DashboardStats::new().with("b", 2));
        let stats = state.dashboard_stats.unwrap();
        assert!(!stats.contains("a"));
        assert_eq!(stats.counter("b"), Some(2));
    }

    #[test]
    fn set_loading_false_leaves_user_signed_out() {
        let store = SessionStore::new();
        let state = store.set_loading(false);
        assert_eq!(state.stack(), Stack::Unauthenticated);
    }

    #[test]
    fn stats_accept_numeric_strings_and_roles() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "incidents": "12",
            "sors": 3,
            "supervisor": "Jane Doe",
            "fire_marshal": null
        }))
        .unwrap();
        assert_eq!(stats.incidents(), Some(12));
        assert_eq!(stats.sors(), Some(3));
        assert_eq!(stats.permits(), None);
        assert_eq!(stats.role("supervisor").as_deref(), Some("Jane Doe"));
        assert_eq!(stats.role("fire_marshal"), None);
    }

    #[test]
    fn user_profile_tolerates_loose_fields() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "name": "Jo",
            "contact": 712345678,
            "is_active": 1,
            "site": "north"
        }))
        .unwrap();
        assert_eq!(user.contact.as_deref(), Some("712345678"));
        assert!(user.active());
    }

    #[test]
    fn end_session_only_fires_once() {
        let store = SessionStore::new();
        store.set_loading(false);
        assert!(store.end_session().is_none());

        store.login(jo(), "abc");
        let ended = store.end_session().unwrap();
        assert!(!ended.is_authenticated);
        assert!(ended.token.is_none());
        assert!(store.end_session().is_none());
    }
}
