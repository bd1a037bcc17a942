mod common;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qhse_client::error::Error;
use qhse_client::navigation::Route;
use qhse_client::storage::{KeyValueStore, MemoryStore};

use common::{harness, signed_in};

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .and(body_json(json!({ "email": "jo@site.test", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh-token",
            "user": { "id": 7, "name": "Jo", "email": "jo@site.test", "is_active": 1 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_persists_credentials_and_caches_stats() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dashboard-stats"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": 3,
            "sors": "12",
            "personells": 40
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, MemoryStore::new());
    h.qhse.bootstrap().await;

    let session = h.qhse.login("jo@site.test", "secret").await.unwrap();

    assert!(session.is_authenticated);
    assert_eq!(session.token.as_deref(), Some("fresh-token"));
    let stats = session.dashboard_stats.unwrap();
    assert_eq!(stats.incidents(), Some(3));
    assert_eq!(stats.sors(), Some(12));
    assert_eq!(stats.personnel(), Some(40));

    assert_eq!(h.store.get("token").await.unwrap().as_deref(), Some("fresh-token"));
    let stored_user: serde_json::Value =
        serde_json::from_str(&h.store.get("user").await.unwrap().unwrap()).unwrap();
    assert_eq!(stored_user["id"], 7);
    assert_eq!(h.ui.routes(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn failed_stats_fetch_keeps_the_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dashboard-stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server, MemoryStore::new());
    h.qhse.bootstrap().await;

    let session = h.qhse.login("jo@site.test", "secret").await.unwrap();

    assert!(session.is_authenticated);
    assert!(session.dashboard_stats.is_none());
    assert!(h.store.contains("token").await);
    assert!(h.ui.alerts().is_empty());
    assert!(h.ui.routes().is_empty());
}

#[tokio::test]
async fn rejected_login_leaves_session_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "bad" })))
        .mount(&server)
        .await;

    let h = harness(&server, MemoryStore::new());
    h.qhse.bootstrap().await;

    let result = h.qhse.login("jo@site.test", "wrong").await;

    assert!(matches!(result, Err(Error::InvalidCredentials)));
    assert!(!h.qhse.session().snapshot().is_authenticated);
    assert!(!h.store.contains("token").await);
    assert!(h.ui.events().is_empty());
}

#[tokio::test]
async fn malformed_login_body_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let h = harness(&server, MemoryStore::new());
    h.qhse.bootstrap().await;

    let result = h.qhse.login("jo@site.test", "secret").await;
    assert!(matches!(result, Err(Error::InvalidCredentials)));
}

#[tokio::test]
async fn logout_clears_storage_and_session() {
    let server = MockServer::start().await;
    let h = signed_in(&server).await;

    let session = h.qhse.logout().await.unwrap();

    assert!(!session.is_authenticated);
    assert!(session.user.is_none());
    assert!(session.token.is_none());
    assert!(session.dashboard_stats.is_none());
    assert!(!h.store.contains("token").await);
    assert!(!h.store.contains("user").await);
}
