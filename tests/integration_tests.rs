use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use church_rides::catalog::ServiceCatalog;
use church_rides::settings::Settings;
use church_rides::{AppState, build_router};
use tower::Service;

const CATALOG: &str = r#"
[[services]]
id = "sunday-worship"
name = "Sunday Worship"
time = "10:30:00"
days = ["Sun"]
category = "RECURRING"
start_date = "2026-01-04"
duration_minutes = 90
location = "12 Chapel Rd"

[[services]]
id = "bible-study"
name = "Second Tuesday Bible Study"
time = "19:00:00"
days = ["Tue"]
category = "FREQUENT_MULTIDAY"
frequency = "MONTHLY"
ordinal = "SECOND"
start_date = "2026-01-01"

[[services]]
id = "christmas-eve"
name = "Christmas Eve Candlelight"
time = "18:00:00"
days = ["Thu"]
category = "ONETIME_ONEDAY"
start_date = "2026-12-24"

[[services]]
id = "revival-2025"
name = "Fall Revival 2025"
time = "19:00:00"
days = ["Sun", "Wed"]
category = "ONETIME_MULTIDAY"
start_date = "2025-10-05"
end_date = "2025-10-29"
"#;

/// Helper function to create test app state over the sample catalog
fn create_test_state() -> AppState {
    let settings = Settings {
        debug: true,
        auth_token: "test-token-123".to_string(),
        enable_swagger: true,
        port: 8080,
        timezone: "America/Chicago".to_string(),
        services_file: "services.toml".to_string(),
        horizon_days: 731,
        max_occurrences: 10,
        church_name: "Grace Chapel".to_string(),
    };
    let catalog = ServiceCatalog::from_toml_str(CATALOG).unwrap();
    AppState::new(settings, catalog).unwrap()
}

/// Helper to extract response body as string
async fn response_body_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(uri: &str) -> (StatusCode, String) {
    let mut app = build_router(create_test_state());
    let response = app
        .call(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, response_body_string(response.into_body()).await)
}

async fn post_preview(body: serde_json::Value) -> (StatusCode, String) {
    let mut app = build_router(create_test_state());
    let response = app
        .call(
            Request::builder()
                .method("POST")
                .uri("/occurrences/preview")
                .header(header::AUTHORIZATION, "Bearer test-token-123")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, response_body_string(response.into_body()).await)
}

#[tokio::test]
async fn test_root_endpoint() {
    // Act
    let (status, body) = get("/").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Church Rides Service Schedule API"));
    assert!(body.contains("/services"));
}

#[tokio::test]
async fn test_healthz() {
    for uri in ["/healthz/live", "/healthz/ready"] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""status":"ok"#));
    }
}

#[tokio::test]
async fn test_services_no_auth_token() {
    let (status, _) = get("/services").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_services_invalid_auth_token() {
    let (status, _) = get("/services?token=invalid-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_services_valid_auth_bearer() {
    // Arrange
    let mut app = build_router(create_test_state());

    // Act
    let response = app
        .call(
            Request::builder()
                .uri("/services")
                .header(header::AUTHORIZATION, "Bearer test-token-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_string(response.into_body()).await;
    let services: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(services.as_array().unwrap().len(), 4);
    assert_eq!(services[0]["id"], "sunday-worship");
    assert_eq!(services[1]["ordinal"], "SECOND");
}

#[tokio::test]
async fn test_get_service() {
    let (status, body) = get("/services/christmas-eve?token=test-token-123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ONETIME_ONEDAY"));

    let (status, _) = get("/services/missing?token=test-token-123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_occurrences_recurring() {
    // Act
    let (status, body) =
        get("/services/sunday-worship/occurrences?token=test-token-123&from=2026-10-14&count=3")
            .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let occurrences: serde_json::Value = serde_json::from_str(&body).unwrap();
    let dates: Vec<&str> = occurrences
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-10-18", "2026-10-25", "2026-11-01"]);
    assert_eq!(occurrences[0]["starts_at"], "2026-10-18T10:30:00");
    assert_eq!(occurrences[0]["service_name"], "Sunday Worship");
}

#[tokio::test]
async fn test_occurrences_second_tuesday() {
    let (status, body) =
        get("/services/bible-study/occurrences?token=test-token-123&from=2026-10-01&count=2")
            .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2026-10-13"));
    assert!(body.contains("2026-11-10"));
    assert!(!body.contains("2026-10-06"));
    assert!(!body.contains("2026-10-20"));
}

#[tokio::test]
async fn test_occurrences_finished_series_is_empty() {
    let (status, body) =
        get("/services/revival-2025/occurrences?token=test-token-123&from=2026-10-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_occurrences_default_count_and_today() {
    let (status, body) =
        get("/services/sunday-worship/occurrences?token=test-token-123").await;
    assert_eq!(status, StatusCode::OK);
    let occurrences: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(occurrences.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_occurrences_invalid_count() {
    let (status, _) =
        get("/services/sunday-worship/occurrences?token=test-token-123&count=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        get("/services/sunday-worship/occurrences?token=test-token-123&count=11").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_occurrences_unknown_service() {
    let (status, _) = get("/services/missing/occurrences?token=test-token-123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_next_recurring_is_a_sunday() {
    let (status, body) = get("/services/sunday-worship/next?token=test-token-123").await;
    assert_eq!(status, StatusCode::OK);
    let next: serde_json::Value = serde_json::from_str(&body).unwrap();
    let date = chrono::NaiveDate::parse_from_str(next["date"].as_str().unwrap(), "%Y-%m-%d")
        .unwrap();
    assert_eq!(chrono::Datelike::weekday(&date), chrono::Weekday::Sun);
}

#[tokio::test]
async fn test_next_finished_series_not_found() {
    let (status, _) = get("/services/revival-2025/next?token=test-token-123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ical_endpoint_no_auth() {
    let (status, _) = get("/services/sunday-worship/occurrences.ical").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ical_endpoint() {
    // Arrange
    let mut app = build_router(create_test_state());

    // Act
    let response = app
        .call(
            Request::builder()
                .uri("/services/sunday-worship/occurrences.ical?token=test-token-123&from=2026-10-18&count=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/calendar"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
        "attachment; filename=sunday-worship.ics"
    );
    let body = response_body_string(response.into_body()).await;
    assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
    assert!(body.contains("20261025T103000"));
}

#[tokio::test]
async fn test_ical_endpoint_no_dates() {
    let (status, _) =
        get("/services/revival-2025/occurrences.ical?token=test-token-123&from=2026-10-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_multiday_cycle() {
    // Arrange
    let body = serde_json::json!({
        "service": {
            "id": "revival",
            "name": "Revival",
            "time": "19:00:00",
            "days": ["Sun", "Wed"],
            "category": "ONETIME_MULTIDAY",
            "frequency": "WEEKLY",
            "start_date": "2026-10-04",
            "end_date": "2026-11-30",
            "cycle": 2
        },
        "from": "2026-10-04",
        "count": 4
    });

    // Act
    let (status, body) = post_preview(body).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let occurrences: serde_json::Value = serde_json::from_str(&body).unwrap();
    let dates: Vec<&str> = occurrences
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["date"].as_str().unwrap())
        .collect();
    assert_eq!(
        dates,
        vec!["2026-10-04", "2026-10-07", "2026-10-18", "2026-10-21"]
    );
}

#[tokio::test]
async fn test_preview_rejects_misconfigured_service() {
    let body = serde_json::json!({
        "service": {
            "id": "broken",
            "name": "Broken",
            "time": "19:00:00",
            "days": [],
            "category": "FREQUENT_MULTIDAY",
            "start_date": "2026-10-04"
        }
    });

    let (status, body) = post_preview(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one weekday"));
}

#[tokio::test]
async fn test_preview_rejects_zero_cycle() {
    let body = serde_json::json!({
        "service": {
            "id": "broken",
            "name": "Broken",
            "time": "19:00:00",
            "days": ["Sun"],
            "category": "RECURRING",
            "start_date": "2026-10-04",
            "cycle": 0
        },
        "from": "2026-10-04"
    });

    let (status, body) = post_preview(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cycle"));
}

#[tokio::test]
async fn test_swagger_docs_served() {
    let (status, body) = get("/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/services/{id}/occurrences"));
}

#[tokio::test]
async fn test_preview_rejects_negative_cycle() {
    let body = serde_json::json!({
        "service": {
            "id": "broken",
            "name": "Broken",
            "time": "19:00:00",
            "days": ["Sun", "Wed"],
            "category": "FREQUENT_MULTIDAY",
            "start_date": "2026-10-04",
            "cycle": -1
        },
        "from": "2026-10-04"
    });

    let (status, body) = post_preview(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cycle must be a positive number"));
}
