use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use colis_api::{app, AppState, AuthConfig};
use colis_core::CarrierOperation;
use colis_order::schema;
use colis_store::{Backends, MemoryWorkbook, ScriptedCarrier};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn test_app(carrier: ScriptedCarrier) -> (Router, Arc<MemoryWorkbook>, Arc<ScriptedCarrier>) {
    let workbook = Arc::new(MemoryWorkbook::demo(schema::header()));
    let carrier = Arc::new(carrier);
    let state = AppState::new(
        Backends::test_double(workbook.clone(), carrier.clone()),
        AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
        },
    );
    (app(state), workbook, carrier)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, code: &str) -> String {
    let (status, body) = send(app, "POST", "/api/login", None, Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_issues_token_with_role() {
    let (app, _, _) = test_app(ScriptedCarrier::new());

    let (status, body) = send(&app, "POST", "/api/login", None, Some(json!({ "code": "456" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "oran");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = send(&app, "POST", "/api/login", None, Some(json!({ "code": "999" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid Code");

    let (status, _) = send(&app, "POST", "/api/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_routes_require_a_session() {
    let (app, _, carrier) = test_app(ScriptedCarrier::new());

    let (status, body) = send(&app, "GET", "/api/commandes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");

    let (status, _) = send(&app, "GET", "/api/commandes", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/noest/wilayas", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(carrier.calls().await.is_empty());
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let (app, workbook, carrier) = test_app(ScriptedCarrier::new().with_response(
        CarrierOperation::CreateOrder,
        json!({ "success": true, "tracking": "T123", "reference": "REF-9" }),
    ));
    let token = login(&app, "123").await;

    let (status, body) = send(&app, "GET", "/api/commandes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["reference"], "REF-001");
    assert_eq!(body[0]["rowId"], 2);

    let order = json!({
        "reference": "REF-9",
        "client": "Ali",
        "phone": "550000000",
        "wilaya": 16,
        "address": "Rue Didouche",
        "commune": "Alger Centre",
        "amount": 4500,
        "product": "Montre",
    });
    let (status, body) = send(&app, "POST", "/api/commandes", Some(&token), Some(order.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Commande ajoutée");
    assert_eq!(body["data"]["reference"], "REF-9");
    assert_eq!(body["data"]["rowId"], 3);

    let (status, body) = send(&app, "POST", "/api/noest/send-from-sheet", Some(&token), Some(json!({ "rowId": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking"], "T123");
    assert_eq!(carrier.call_count(CarrierOperation::CreateOrder).await, 1);

    let (_, body) = send(&app, "GET", "/api/commandes", Some(&token), None).await;
    assert_eq!(body[1]["status"], "System");
    assert_eq!(body[1]["tracking"], "T123");
    assert_eq!(body[1]["phone"], "0550000000");

    let mut cancel = order;
    cancel["status"] = json!("Annuler");
    let (status, _) = send(&app, "PUT", "/api/commandes/3", Some(&token), Some(cancel)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/commandes", Some(&token), None).await;
    assert_eq!(body[1]["status"], "Annuler");
    assert_eq!(body[1]["tracking"], "");

    let (status, _) = send(&app, "DELETE", "/api/commandes/2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workbook.rows("alger").await.len(), 2);
}

#[tokio::test]
async fn test_tenants_only_see_their_partition() {
    let (app, _, _) = test_app(ScriptedCarrier::new());
    let token = login(&app, "456").await;

    let (status, body) = send(&app, "GET", "/api/commandes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unknown_rows_are_not_found() {
    let (app, _, carrier) = test_app(ScriptedCarrier::new());
    let token = login(&app, "123").await;

    let (status, _) = send(&app, "PUT", "/api/commandes/40", Some(&token), Some(json!({ "client": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/noest/send-from-sheet", Some(&token), Some(json!({ "rowId": 40 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/api/noest/send-from-sheet", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "rowId is required");
    assert!(carrier.calls().await.is_empty());
}

#[tokio::test]
async fn test_invalid_order_is_rejected_before_the_carrier() {
    let (app, _, carrier) = test_app(ScriptedCarrier::new());
    let token = login(&app, "123").await;

    let (_, body) = send(&app, "POST", "/api/commandes", Some(&token), Some(json!({ "client": "Sans Tel", "wilaya": "16" }))).await;
    let row_id = body["data"]["rowId"].as_u64().unwrap();

    let (status, body) = send(&app, "POST", "/api/noest/send-from-sheet", Some(&token), Some(json!({ "rowId": row_id }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("phone"));
    assert_eq!(carrier.call_count(CarrierOperation::CreateOrder).await, 0);
}

#[tokio::test]
async fn test_carrier_refusal_is_reported_with_details() {
    let (app, _, _) = test_app(ScriptedCarrier::new().with_response(
        CarrierOperation::CreateOrder,
        json!({ "success": false, "message": "wilaya inconnue" }),
    ));
    let token = login(&app, "123").await;

    let (status, body) = send(&app, "POST", "/api/noest/send-from-sheet", Some(&token), Some(json!({ "rowId": 2 }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["message"], "wilaya inconnue");
}

#[tokio::test]
async fn test_message_status_defaults_to_oui() {
    let (app, workbook, _) = test_app(ScriptedCarrier::new());
    let token = login(&app, "123").await;

    let (status, body) = send(&app, "PUT", "/api/commandes/2/message-status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OUI");
    assert_eq!(body["column"], 19);
    assert_eq!(workbook.rows("alger").await[1][19], "OUI");

    let (_, body) = send(&app, "PUT", "/api/commandes/2/message-status", Some(&token), Some(json!({ "status": "NON" }))).await;
    assert_eq!(body["status"], "NON");

    let (_, body) = send(&app, "GET", "/api/commandes", Some(&token), None).await;
    assert_eq!(body[0]["messageSent"], false);
}

#[tokio::test]
async fn test_references_and_validation_rules() {
    let (app, _, _) = test_app(ScriptedCarrier::new());
    let token = login(&app, "123").await;

    let (status, body) = send(&app, "GET", "/api/references", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wilayas"][1]["name"], "Alger");
    assert_eq!(body["wilayas"][1]["delivery_price_desk"], "300");
    assert_eq!(body["communes"].as_array().unwrap().len(), 3);
    assert_eq!(body["stations"][0]["code"], "STOP01");

    let (status, body) = send(&app, "GET", "/api/commandes/validation/A", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sheet"], "alger");
    assert_eq!(body["validationRules"]["condition"]["type"], "ONE_OF_LIST");
}

#[tokio::test]
async fn test_carrier_passthrough_routes() {
    let (app, _, carrier) = test_app(ScriptedCarrier::new().with_label(b"%PDF-test".to_vec()));
    let token = login(&app, "123").await;

    let (status, _) = send(&app, "GET", "/api/noest/communes/16", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api/noest/order/update", Some(&token), Some(json!({ "tracking": "T1", "poids": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", "/api/noest/order/validate", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tracking required");

    let calls = carrier.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (CarrierOperation::GetCommunes, json!({ "wilaya_id": "16" })));
    assert_eq!(calls[1].1, json!({ "tracking": "T1", "poids": 2 }));

    let request = Request::builder()
        .uri("/api/noest/order/label/T1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"label-T1.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-test");
}

#[tokio::test]
async fn test_label_filename_is_quoted_and_restricted() {
    let (app, _, _) = test_app(ScriptedCarrier::new().with_label(b"%PDF-test".to_vec()));
    let token = login(&app, "123").await;

    let request = Request::builder()
        .uri("/api/noest/order/label/T1%3B%20x%3D%22y%22")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"label-T1xy.pdf\""
    );
}
