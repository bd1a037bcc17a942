mod common;

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qhse_client::config::UNAUTHORIZED_MESSAGE;
use qhse_client::error::Error;
use qhse_client::navigation::{EventLog, Route, UiEvent};
use qhse_client::reports::{IncidentFilter, IncidentKind, ReportList};
use qhse_client::session::Stack;
use qhse_client::storage::{KeyValueStore, MemoryStore, StorageError};
use qhse_client::Qhse;

use common::{harness, list_body, options, signed_in, TOKEN, USER_JSON};

#[tokio::test]
async fn requests_carry_the_stored_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/incidents"))
        .and(query_param("type", "1"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([
            { "id": 4, "incident_description": "Ladder slipped" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let incidents = h
        .qhse
        .incidents(IncidentFilter::Type(IncidentKind::NearMiss))
        .list()
        .await
        .unwrap();

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].incident_description.as_deref(), Some("Ladder slipped"));
    assert!(h.ui.events().is_empty());
}

#[tokio::test]
async fn scenario_c_unauthorized_purges_session_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/icas"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut changes = h.qhse.session().subscribe();

    let result = h.qhse.icas().list().await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert!(!h.store.contains("token").await);
    assert!(!h.store.contains("user").await);

    let session = h.qhse.session().snapshot();
    assert!(!session.is_authenticated);
    assert!(session.user.is_none());
    assert!(session.token.is_none());
    assert_eq!(session.stack(), Stack::Unauthenticated);

    assert_eq!(
        h.ui.events(),
        vec![
            UiEvent::Alert(UNAUTHORIZED_MESSAGE.to_string()),
            UiEvent::Navigate(Route::Login),
        ]
    );
    let broadcast = changes.recv().await.unwrap();
    assert!(!broadcast.is_authenticated);
}

#[tokio::test]
async fn overlapping_unauthorized_calls_redirect_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let tasks = h.qhse.tasks();
    let permits = h.qhse.permits();
    let trainings = h.qhse.trainings();

    let (a, b, c) = tokio::join!(tasks.list(), permits.list(), trainings.list());

    assert!(matches!(a, Err(Error::Unauthorized)));
    assert!(matches!(b, Err(Error::Unauthorized)));
    assert!(matches!(c, Err(Error::Unauthorized)));
    assert_eq!(h.ui.alerts(), vec![UNAUTHORIZED_MESSAGE.to_string()]);
    assert_eq!(h.ui.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn missing_token_is_treated_as_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([]))))
        .expect(0)
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    h.store.remove("token").await.unwrap();

    let result = h.qhse.permits().list().await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert!(!h.qhse.session().snapshot().is_authenticated);
    assert_eq!(h.ui.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn other_failures_alert_and_keep_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let result = h.qhse.personnel().list().await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected API error, got {:?}", other.map(|rows| rows.len())),
    }
    assert!(h.qhse.session().snapshot().is_authenticated);
    assert!(h.store.contains("token").await);
    assert_eq!(h.ui.alerts(), vec!["Error fetching personnel data".to_string()]);
    assert!(h.ui.routes().is_empty());
}

#[tokio::test]
async fn unexpected_body_alerts_without_ending_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let result = h.qhse.tasks().list().await;

    assert!(matches!(result, Err(Error::Json(_))));
    assert_eq!(h.ui.alerts(), vec!["Error fetching tasks".to_string()]);
    assert!(h.qhse.session().snapshot().is_authenticated);
}

#[tokio::test]
async fn signed_out_client_does_not_redirect_again() {
    let server = MockServer::start().await;
    let h = harness(&server, MemoryStore::new());
    h.qhse.bootstrap().await;

    let result = h.qhse.tasks().list().await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert!(h.ui.events().is_empty());
}

/// Memory store whose first removals fail
struct StickyStore {
    inner: MemoryStore,
    failing_removes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for StickyStore {
    async fn get(&self, key: &str) -> qhse_client::storage::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> qhse_client::storage::Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> qhse_client::storage::Result<()> {
        let left = self.failing_removes.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_removes.store(left - 1, Ordering::SeqCst);
            return Err(StorageError::new("storage busy".to_string()));
        }
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn purge_retries_a_failed_clear() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(StickyStore {
        inner: MemoryStore::with_entries([("token", TOKEN), ("user", USER_JSON)]),
        failing_removes: AtomicUsize::new(2),
    });
    let ui = Arc::new(EventLog::new());
    let qhse = Qhse::new(options(&server), store.clone(), ui.clone(), ui.clone()).unwrap();
    assert!(qhse.bootstrap().await.is_authenticated);

    let result = qhse.tasks().list().await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert!(!store.inner.contains("token").await);
    assert!(!store.inner.contains("user").await);
    assert_eq!(ui.routes(), vec![Route::Login]);
}
