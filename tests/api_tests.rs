//! API tests against a running server
//!
//! Requires a server on localhost:5000 with a bootstrap administrator
//! `admin` / `admin-password`. Run with: cargo test -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:5000/api";

async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin-password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["data"]["token"].as_str().expect("No token in response").to_string()
}

async fn create(client: &Client, token: &str, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED, "POST {}", path);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = Client::new()
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = chrono::Utc::now().timestamp_millis();

    let patient = create(
        &client,
        &token,
        "/patients",
        json!({ "first_name": "Amina", "last_name": format!("Test{}", suffix), "patient_type": "general" }),
    )
    .await;
    let equipment = create(
        &client,
        &token,
        "/equipment",
        json!({ "name": "Wheelchair", "category": "mobility", "serial_number": format!("WC-{}", suffix) }),
    )
    .await;

    let loan = create(
        &client,
        &token,
        "/loans",
        json!({ "patient_id": patient["id"], "equipment_id": equipment["id"] }),
    )
    .await;
    assert_eq!(loan["status"], "active");

    // Equipment is now on loan
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "patient_id": patient["id"], "equipment_id": equipment["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A patient holding equipment cannot be deleted
    let response = client
        .delete(format!("{}/patients/{}", BASE_URL, patient["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .bearer_auth(&token)
        .json(&json!({ "condition": "good" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["status"], "completed");

    // Returning twice is an invalid transition
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .bearer_auth(&token)
        .json(&json!({ "condition": "good" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["status"], "available");
}

#[tokio::test]
#[ignore]
async fn test_export_loans_csv() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/loans/export", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = response.text().await.unwrap();
    assert!(body.starts_with("id,"));
}

async fn patient_and_equipment(client: &Client, token: &str, tag: &str) -> (Value, Value) {
    let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let patient = create(
        client,
        token,
        "/patients",
        json!({ "first_name": "Karim", "last_name": format!("{}{}", tag, suffix) }),
    )
    .await;
    let equipment = create(
        client,
        token,
        "/equipment",
        json!({ "name": "Walker", "serial_number": format!("{}-{}", tag, suffix) }),
    )
    .await;
    (patient, equipment)
}

#[tokio::test]
#[ignore]
async fn test_concurrent_loans_on_one_item_lend_it_once() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (patient, equipment) = patient_and_equipment(&client, &token, "RACE").await;

    let attempts = (0..5).map(|_| {
        client
            .post(format!("{}/loans", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({ "patient_id": patient["id"], "equipment_id": equipment["id"] }))
            .send()
    });
    let responses = futures_join_all(attempts).await;

    let created = responses
        .iter()
        .filter(|r| r.as_ref().map(|r| r.status() == StatusCode::CREATED).unwrap_or(false))
        .count();
    assert_eq!(created, 1);
}

#[tokio::test]
#[ignore]
async fn test_return_racing_a_status_edit_stays_consistent() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (patient, equipment) = patient_and_equipment(&client, &token, "EDIT").await;
    let loan = create(
        &client,
        &token,
        "/loans",
        json!({ "patient_id": patient["id"], "equipment_id": equipment["id"] }),
    )
    .await;

    let returned = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .bearer_auth(&token)
        .json(&json!({ "condition": "good" }))
        .send();
    let edited = client
        .put(format!("{}/equipment/{}", BASE_URL, equipment["id"]))
        .bearer_auth(&token)
        .json(&json!({ "status": "lost" }))
        .send();
    let (returned, edited) = tokio::join!(returned, edited);
    assert!(returned.expect("Failed to send request").status().is_success());
    let edited = edited.expect("Failed to send request").status();

    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");

    if edited.is_success() {
        assert_eq!(body["data"]["status"], "lost");
    } else {
        assert_eq!(edited, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["data"]["status"], "available");
    }
}

/// Await every request concurrently on the test runtime
async fn futures_join_all<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("request task panicked"));
    }
    results
}
