//! Reservation and health routes end to end against a real pool file.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn test_reserve_premise_returns_first_free_row() {
    let app = TestApp::with_rows(&[
        "P1,AB1 2CD,High St,D1,No,No,",
        "P2,AB1 2CE,Low Rd,D2,No,No,",
    ]);

    let (status, body) = app.reserve("premise", "TC-100").await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["kind"], "premise");
    assert_eq!(body["data"]["requested_id"], "P1");
    assert_eq!(body["data"]["tag"], "TC-100");
    assert_eq!(body["data"]["record"]["row"], 0);
    assert_eq!(body["data"]["record"]["columns"][0], "Premise_ID");
    assert_eq!(
        body["data"]["record"]["values"],
        json!(["P1", "AB1 2CD", "High St", "D1", "Yes", "No", "TC-100"])
    );

    assert!(app.pool_contents().contains("P2,AB1 2CE,Low Rd,D2,No,No,\n"));
}

#[tokio::test]
async fn test_reserve_device_uses_device_flag() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,Yes,Yes,TC-1", "P2,PC2,S2,D2,Yes,No,TC-2"]);

    let (status, body) = app.reserve("device", "TC-3").await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["requested_id"], "D2");
}

#[tokio::test]
async fn test_reserve_exhausted_is_not_found() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,Yes,No,TC-1"]);
    let before = app.pool_contents();

    let (status, body) = app.reserve("premise", "TC-2").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("premise ID"));
    assert_eq!(app.pool_contents(), before);
}

#[tokio::test]
async fn test_reserve_rejects_bad_input() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,No,No,"]);

    for payload in [
        json!({ "kind": "premise", "tag": "" }),
        json!({ "kind": "cabinet", "tag": "TC-1" }),
        json!({ "kind": "premise", "tag": "x".repeat(129) }),
        json!({ "tag": "TC-1" }),
    ] {
        let (status, body) = app
            .request("POST", "/api/reservations", Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    assert!(app.pool_contents().contains("P1,PC1,S1,D1,No,No,"));
}

#[tokio::test]
async fn test_undecodable_body_uses_api_error_shape() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,No,No,"]);

    let (status, body) = app
        .request("POST", "/api/reservations", Some(json!({ "kind": 5, "tag": "TC-1" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());

    let (status, body) = app
        .request_raw(
            "POST",
            "/api/reservations",
            Some("text/plain"),
            r#"{"kind":"premise","tag":"TC-1"}"#.to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = app
        .request_raw("POST", "/api/reservations", Some("application/json"), "{".to_string())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    assert!(app.pool_contents().contains("P1,PC1,S1,D1,No,No,"));
}

#[tokio::test]
async fn test_padded_tag_is_trimmed_before_length_check() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,No,No,"]);
    let tag = "x".repeat(128);

    let (status, body) = app.reserve("premise", &format!("  {tag}  ")).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["tag"], tag);
}

#[tokio::test]
async fn test_missing_pool_is_unavailable() {
    let app = TestApp::with_contents(None);

    let (status, body) = app.reserve("premise", "TC-1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    assert!(body["message"].as_str().unwrap().contains("premise_data.csv"));

    let (status, _) = app.request("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_bad_flag_is_schema_error() {
    let app = TestApp::with_rows(&["P1,PC1,S1,D1,maybe,No,"]);

    let (status, body) = app.reserve("premise", "TC-1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "SCHEMA_ERROR");
    assert_eq!(body["details"]["retryable"], false);
}

#[tokio::test]
async fn test_unreadable_pool_is_distinct_from_bad_values() {
    let ragged = TestApp::with_contents(Some(&format!("{}\nP1,PC1\n", helpers::HEADER)));
    let (status, body) = ragged.reserve("premise", "TC-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "MALFORMED_POOL");

    let bad_flag = TestApp::with_rows(&["P1,PC1,S1,D1,maybe,No,"]);
    let (_, flag_body) = bad_flag.reserve("premise", "TC-1").await;
    assert_eq!(flag_body["error"], "SCHEMA_ERROR");
    assert_ne!(body["error"], flag_body["error"]);

    let (status, body) = ragged.request("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "MALFORMED_POOL");
}

#[tokio::test]
async fn test_health_reports_pool_and_repairs_columns() {
    let app = TestApp::with_contents(Some("Premise_ID,Dummy_Device_ID\nP1,D1\nP2,D2\n"));

    let (status, body) = app.request("GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["pool"]["rows"], 2);
    assert_eq!(body["data"]["pool"]["free_premise"], 2);
    assert_eq!(
        body["data"]["pool"]["added_columns"],
        json!(["Utilized_PID", "Utilized_Dev", "Test_Case_ID"])
    );
    assert!(
        app.pool_contents()
            .starts_with("Premise_ID,Dummy_Device_ID,Utilized_PID,Utilized_Dev,Test_Case_ID\n")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_distinct_rows() {
    let app = TestApp::with_rows(&[
        "P1,PC1,S1,D1,No,No,",
        "P2,PC2,S2,D2,No,No,",
        "P3,PC3,S3,D3,No,No,",
    ]);

    let requests = (0..6).map(|i| {
        let tag = format!("TC-{i}");
        let app = &app;
        async move { app.reserve("premise", &tag).await }
    });
    let results = futures::future::join_all(requests).await;

    let mut granted: Vec<String> = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::OK)
        .map(|(_, body)| body["data"]["requested_id"].as_str().unwrap().to_string())
        .collect();
    granted.sort();

    assert_eq!(granted, vec!["P1", "P2", "P3"]);
    assert_eq!(
        results
            .iter()
            .filter(|(status, _)| *status == StatusCode::NOT_FOUND)
            .count(),
        3
    );
}
