//! API integration tests

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to create an equipment item and return its ID
async fn create_item(client: &Client, name: &str, quantity: i32) -> i64 {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .json(&json!({
            "name": name,
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to create equipment item");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

/// Helper to create a template activity requisitioning one item
async fn create_template(client: &Client, title: &str, item_id: i64, quantity: i32) -> i64 {
    let response = client
        .post(format!("{}/activities", BASE_URL))
        .json(&json!({
            "owner_id": 1,
            "title": title
        }))
        .send()
        .await
        .expect("Failed to create activity");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response");

    let response = client
        .put(format!("{}/activities/{}", BASE_URL, id))
        .json(&json!({
            "equipment": [
                { "item_id": item_id, "quantity": quantity, "important": true }
            ]
        }))
        .send()
        .await
        .expect("Failed to update activity");
    assert!(response.status().is_success());

    id
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_equipment_crud() {
    let client = Client::new();

    let id = create_item(&client, "Test oscilloscope", 4).await;

    // Read it back annotated
    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to get item");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 4);
    assert_eq!(body["balance"], 4);

    // Clearing availability zeroes the balance
    let response = client
        .put(format!("{}/equipment/{}", BASE_URL, id))
        .json(&json!({ "available": false }))
        .send()
        .await
        .expect("Failed to update item");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to get item");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["balance"], 0);

    // Delete and confirm it is gone
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to delete item");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to get item");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_equipment_validation() {
    let client = Client::new();

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .json(&json!({
            "name": "",
            "quantity": -1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_booking_flow() {
    let client = Client::new();

    let item_id = create_item(&client, "Flow test burner", 10).await;
    let template_id = create_template(&client, "Flow test practical", item_id, 3).await;

    let start = Utc::now() + Duration::hours(24);
    let end = start + Duration::hours(1);

    // Book the template
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": template_id,
            "owner_id": 1,
            "location": "Lab 3",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().expect("No id in response");
    assert_eq!(booking["status"], "Pending");

    // The booking references a fresh instance, not the template
    let instance_id = booking["activity_id"].as_i64().unwrap();
    assert_ne!(instance_id, template_id);

    let response = client
        .get(format!("{}/activities/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to get instance");
    let instance: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(instance["temporary"], true);
    assert_eq!(instance["copied_from"].as_i64().unwrap(), template_id);

    // Deleting the instance through the template route is refused; it
    // belongs to the booking
    let response = client
        .delete(format!("{}/activities/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Booking the instance directly is refused
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": instance_id,
            "owner_id": 1,
            "location": "Lab 3",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Status change
    let response = client
        .put(format!("{}/bookings/{}/status", BASE_URL, booking_id))
        .json(&json!({ "status": "Ready" }))
        .send()
        .await
        .expect("Failed to set status");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "Ready");

    // The owner got a notification about it
    let response = client
        .get(format!("{}/users/1/notifications", BASE_URL))
        .send()
        .await
        .expect("Failed to drain notifications");
    let notes: Value = response.json().await.expect("Failed to parse response");
    assert!(notes.as_array().map(|a| !a.is_empty()).unwrap_or(false));

    // Delete takes the temporary instance with it
    let response = client
        .delete(format!("{}/bookings/{}", BASE_URL, booking_id))
        .send()
        .await
        .expect("Failed to delete booking");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/activities/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to get instance");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_amendment_notice_window() {
    let client = Client::new();

    let item_id = create_item(&client, "Notice test kit", 2).await;
    let template_id = create_template(&client, "Notice test practical", item_id, 1).await;

    // Booking starting in 30 minutes: inside the notice window
    let start = Utc::now() + Duration::minutes(30);
    let end = start + Duration::hours(1);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": template_id,
            "owner_id": 1,
            "location": "Lab 1",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .json(&json!({ "location": "Lab 2" }))
        .send()
        .await
        .expect("Failed to send amendment");
    assert_eq!(response.status(), 422);

    // Postponing later is still allowed
    let response = client
        .post(format!("{}/bookings/{}/postpone", BASE_URL, booking_id))
        .json(&json!({
            "start_time": start + Duration::hours(2),
            "end_time": end + Duration::hours(2)
        }))
        .send()
        .await
        .expect("Failed to postpone");
    assert!(response.status().is_success());

    // Postponing earlier is not
    let response = client
        .post(format!("{}/bookings/{}/postpone", BASE_URL, booking_id))
        .json(&json!({
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to send postpone");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_reservation_clash() {
    let client = Client::new();

    let item_id = create_item(&client, "Clash test microscope", 5).await;
    let template_id = create_template(&client, "Clash test practical", item_id, 5).await;

    let start = Utc::now() + Duration::hours(48);
    let end = start + Duration::hours(1);

    // Existing booking takes all five units
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": template_id,
            "owner_id": 1,
            "location": "Lab 4",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), 201);

    // One more unit inside the window clashes
    let response = client
        .post(format!("{}/reservations/check", BASE_URL))
        .json(&json!({
            "items": [{ "item_id": item_id, "quantity": 1 }],
            "start_time": start + Duration::minutes(30),
            "end_time": start + Duration::minutes(45)
        }))
        .send()
        .await
        .expect("Failed to check reservation");
    assert!(response.status().is_success());
    let report: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(report["ok"], false);
    assert_eq!(report["clashes"].as_array().unwrap().len(), 1);
    assert_eq!(report["clashes"][0]["net_quantity"], 0);

    // Outside the window it is fine
    let response = client
        .post(format!("{}/reservations/check", BASE_URL))
        .json(&json!({
            "items": [{ "item_id": item_id, "quantity": 1 }],
            "start_time": end + Duration::hours(1),
            "end_time": end + Duration::hours(2)
        }))
        .send()
        .await
        .expect("Failed to check reservation");
    let report: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(report["ok"], true);
    assert!(report["clashes"].as_array().unwrap().is_empty());

    // Zero quantity is rejected at the boundary
    let response = client
        .post(format!("{}/reservations/check", BASE_URL))
        .json(&json!({
            "items": [{ "item_id": item_id, "quantity": 0 }],
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_amendment_effective_window() {
    let client = Client::new();

    let item_id = create_item(&client, "Window test clamp", 2).await;
    let template_id = create_template(&client, "Window test practical", item_id, 1).await;

    let start = Utc::now() + Duration::hours(24);
    let end = start + Duration::hours(1);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": template_id,
            "owner_id": 1,
            "location": "Lab 5",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().unwrap();

    // Moving only the start past the stored end would invert the window
    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .json(&json!({ "start_time": end + Duration::hours(1) }))
        .send()
        .await
        .expect("Failed to send amendment");
    assert_eq!(response.status(), 400);

    // Moving only the end before the stored start is just as bad
    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .json(&json!({ "end_time": start - Duration::hours(1) }))
        .send()
        .await
        .expect("Failed to send amendment");
    assert_eq!(response.status(), 400);

    // A lone bound that keeps the window valid goes through
    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .json(&json!({ "start_time": start + Duration::minutes(15) }))
        .send()
        .await
        .expect("Failed to send amendment");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_sweep_idempotence() {
    let client = Client::new();

    let item_id = create_item(&client, "Sweep test tongs", 1).await;
    let template_id = create_template(&client, "Sweep test practical", item_id, 1).await;

    // A booking whose window has already elapsed
    let start = Utc::now() - Duration::hours(2);
    let end = start + Duration::hours(1);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "activity_id": template_id,
            "owner_id": 1,
            "location": "Lab 6",
            "start_time": start,
            "end_time": end
        }))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), 201);

    // First sweep removes it
    let response = client
        .post(format!("{}/maintenance/sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to trigger sweep");
    assert!(response.status().is_success());
    let report: Value = response.json().await.expect("Failed to parse response");
    assert!(report["bookings_cleaned"].as_u64().unwrap() >= 1);

    // Nothing has expired since, so a second run removes nothing
    let response = client
        .post(format!("{}/maintenance/sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to trigger sweep");
    assert!(response.status().is_success());
    let report: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(report["bookings_cleaned"], 0);
}

#[tokio::test]
#[ignore]
async fn test_maintenance_status() {
    let client = Client::new();

    let response = client
        .get(format!("{}/maintenance", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["active"], false);
}
