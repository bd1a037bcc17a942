mod common;

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qhse_client::error::Error;
use qhse_client::reports::{IncidentFilter, IncidentKind};

use common::{list_body, signed_in};

fn personnel_rows(count: i64) -> serde_json::Value {
    let rows: Vec<_> = (1..=count)
        .map(|id| json!({ "id": id, "designation": format!("Role {}", id), "number": id }))
        .collect();
    json!({ "data": { "data": rows } })
}

#[tokio::test]
async fn list_screen_pages_eight_rows_at_a_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(ResponseTemplate::new(200).set_body_json(personnel_rows(19)))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut screen = h.qhse.list_screen(h.qhse.personnel());
    screen.refresh().await.unwrap();

    assert!(!screen.is_loading());
    assert_eq!(screen.total_pages(), 3);
    assert_eq!(screen.page_items().len(), 8);
    assert_eq!(screen.page_items()[0].id, 1);

    screen.next_page();
    screen.next_page();
    assert_eq!(screen.next_page(), 3);
    assert_eq!(screen.page_items().len(), 3);
    assert_eq!(screen.page_items()[0].id, 17);

    assert_eq!(screen.previous_page(), 2);
    assert_eq!(screen.go_to_page(0), 1);
}

#[tokio::test]
async fn view_opens_a_loaded_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(ResponseTemplate::new(200).set_body_json(personnel_rows(3)))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut screen = h.qhse.list_screen(h.qhse.personnel());
    screen.refresh().await.unwrap();

    let row = screen.view(2).unwrap();
    assert_eq!(row.designation.as_deref(), Some("Role 2"));
    assert!(screen.view(99).is_none());
    assert!(screen.selected().is_none());
}

#[tokio::test]
async fn delete_confirms_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/incidents/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/incidents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([{ "id": 1 }]))))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut screen = h
        .qhse
        .list_screen(h.qhse.incidents(IncidentFilter::Type(IncidentKind::NearMiss)));
    screen.delete(2).await.unwrap();

    assert_eq!(h.ui.alerts(), vec!["Near Miss deleted successfully".to_string()]);
    assert_eq!(screen.items().len(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(ResponseTemplate::new(200).set_body_json(personnel_rows(2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut screen = h.qhse.list_screen(h.qhse.personnel());
    screen.refresh().await.unwrap();
    assert!(screen.refresh().await.is_err());

    assert_eq!(screen.items().len(), 2);
    assert!(!screen.is_loading());
}

#[tokio::test]
async fn unmounted_screen_drops_late_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/personell"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(personnel_rows(5))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let mut screen = h.qhse.list_screen(h.qhse.personnel());
    let scope = screen.scope();

    let unmount = async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        scope.unmount();
    };
    let (result, ()) = tokio::join!(screen.refresh(), unmount);

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(screen.items().is_empty());
    assert!(matches!(screen.refresh().await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn dashboard_refresh_replaces_cached_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dashboard-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "incidents": 1 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dashboard-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sors": 2 })))
        .mount(&server)
        .await;

    let h = signed_in(&server).await;
    let dashboard = h.qhse.dashboard();

    dashboard.refresh().await.unwrap();
    assert_eq!(dashboard.stats().unwrap().incidents(), Some(1));

    dashboard.refresh().await.unwrap();
    let stats = dashboard.stats().unwrap();
    assert_eq!(stats.sors(), Some(2));
    assert!(!stats.contains("incidents"));
}
