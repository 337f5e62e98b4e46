//! Scenario: admin API client against a mock server
//!
//! # Coverage
//! 1. Orders page: query params, bearer + system-key headers, envelope decode.
//! 2. `since` is only sent for incremental queries.
//! 3. `success: false` surfaces as `FetchError::Api` with the server message.
//! 4. Non-2xx surfaces as `FetchError::Api` with the status code.
//! 5. Garbage body surfaces as `FetchError::Decode`.
//! 6. Connection failure surfaces as `FetchError::Transport`.
//! 7. A record with malformed embedded metadata does not fail the page.
//! 8. Missing `data` decodes as an empty page.
//! 9. A `null` display column in one record does not fail the page.

use std::sync::Arc;
use std::time::Duration;

use adm_feed::{AdminApiClient, AuxField, FetchError, ListQuery, ListingSource, StaticCredentials};
use adm_reconcile::{Cursor, Filter};
use httpmock::prelude::*;
use serde_json::json;

fn client(base: &str, creds: StaticCredentials) -> AdminApiClient {
    AdminApiClient::new(base, Arc::new(creds), Duration::from_secs(5)).unwrap()
}

fn incremental(filter: Filter, since: &str) -> ListQuery {
    ListQuery {
        filter,
        since: Cursor::new(since),
        limit: 50,
    }
}

#[tokio::test]
async fn orders_page_is_fetched_with_headers_and_params() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/admin/orders")
                .query_param("limit", "50")
                .query_param("status", "paid")
                .header("Authorization", "Bearer tok-1")
                .header("X-System-Key", "sys-1");
            then.status(200).json_body(json!({
                "success": true,
                "data": {
                    "items": [
                        {"id": "A", "orderNumber": "N-1", "status": "paid",
                         "createdAt": "2024-06-01T10:00:00.000Z", "budgetAmount": 20},
                        {"id": "B", "orderNumber": "N-2", "status": "paid",
                         "createdAt": "2024-06-01T09:00:00.000Z", "budgetAmount": "12.5"}
                    ],
                    "next_since": "2024-06-01T10:00:00.000Z",
                    "total": 2
                }
            }));
        })
        .await;

    let c = client(
        &server.base_url(),
        StaticCredentials::bearer("tok-1").with_system_key("sys-1"),
    );
    let page = c
        .fetch_page(&ListQuery::first_page(Filter::status("paid"), 50))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].budget_amount, 12.5);
    assert_eq!(page.next_cursor.as_deref(), Some("2024-06-01T10:00:00.000Z"));
    assert_eq!(page.total, Some(2));
    assert_eq!(c.source_name(), "admin-orders");
}

#[tokio::test]
async fn since_is_sent_for_incremental_queries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/admin/orders")
                .query_param("since", "C1");
            then.status(200)
                .json_body(json!({"success": true, "data": {"items": []}}));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let page = c.fetch_orders(&incremental(Filter::all(), "C1")).await.unwrap();

    mock.assert_async().await;
    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn unsuccessful_envelope_is_api_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(200)
                .json_body(json!({"success": false, "message": "加载失败"}));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let err = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::Api {
            status: None,
            message: "加载失败".to_string()
        }
    );
}

#[tokio::test]
async fn http_error_carries_status_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(503)
                .json_body(json!({"success": false, "message": "maintenance"}));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let err = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::Api {
            status: Some(503),
            message: "maintenance".to_string()
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn non_json_error_body_uses_reason_phrase() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(401).body("nope");
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let err = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::Api {
            status: Some(401),
            message: "Unauthorized".to_string()
        }
    );
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(200).body("<html>proxy</html>");
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let err = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Port 9 (discard) on loopback is not served in test environments.
    let c = client("http://127.0.0.1:9", StaticCredentials::anonymous());
    let err = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_metadata_does_not_fail_the_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"items": [
                    {"id": "A", "createdAt": "2024-06-01T10:00:00Z", "metadata": "{broken"},
                    {"id": "B", "createdAt": "2024-06-01T09:00:00Z", "metadata": {"ok": true}}
                ]}
            }));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let page = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap();

    assert_eq!(page.items[0].metadata, AuxField::Raw("{broken".to_string()));
    assert_eq!(page.items[1].metadata.get("ok"), Some(&json!(true)));
}

#[tokio::test]
async fn null_display_column_does_not_fail_the_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"items": [
                    {"id": "A", "orderNumber": "N-1", "status": "paid",
                     "createdAt": "2024-06-01T10:00:00Z", "deliveryAddress": null,
                     "userSequence": null, "budgetAmount": 20},
                    {"id": "B", "orderNumber": "N-2", "status": "paid",
                     "createdAt": "2024-06-01T09:00:00Z", "deliveryAddress": "2 Side St"}
                ]}
            }));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let page = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].delivery_address, "");
    assert_eq!(page.items[0].user_sequence, None);
    assert_eq!(page.items[1].delivery_address, "2 Side St");
}

#[tokio::test]
async fn missing_data_is_empty_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/orders");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::anonymous());
    let page = c
        .fetch_orders(&ListQuery::first_page(Filter::all(), 50))
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn order_status_update_posts_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/admin/orders/A/status")
                .json_body(json!({"status": "completed"}));
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let c = client(&server.base_url(), StaticCredentials::bearer("t"));
    c.update_order_status("A", "completed").await.unwrap();
    mock.assert_async().await;
}
