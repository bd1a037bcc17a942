#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use wiremock::MockServer;

use qhse_client::config::ClientOptions;
use qhse_client::navigation::EventLog;
use qhse_client::storage::{KeyValueStore, MemoryStore};
use qhse_client::Qhse;

pub const TOKEN: &str = "abc";
pub const USER_JSON: &str = r#"{"id":1,"name":"Jo"}"#;

pub struct Harness {
    pub qhse: Qhse,
    pub store: Arc<MemoryStore>,
    pub ui: Arc<EventLog>,
}

pub fn options(server: &MockServer) -> ClientOptions {
    ClientOptions::default()
        .with_api_url(&format!("{}/api/v1/", server.uri()))
        .with_webapp_url(&server.uri())
        .with_media_url("https://media.test/public")
}

pub fn harness(server: &MockServer, store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let ui = Arc::new(EventLog::new());
    let qhse = Qhse::new(
        options(server),
        store.clone() as Arc<dyn KeyValueStore>,
        ui.clone(),
        ui.clone(),
    )
    .unwrap();
    Harness { qhse, store, ui }
}

/// A client whose storage already holds a sign-in, bootstrapped
pub async fn signed_in(server: &MockServer) -> Harness {
    let h = harness(
        server,
        MemoryStore::with_entries([("token", TOKEN), ("user", USER_JSON)]),
    );
    let session = h.qhse.bootstrap().await;
    assert!(session.is_authenticated);
    h
}

pub fn list_body(rows: serde_json::Value) -> serde_json::Value {
    json!({ "data": rows })
}
