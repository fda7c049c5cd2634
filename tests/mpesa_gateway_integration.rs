//! Integration tests for the Daraja gateway adapter.
//!
//! A local axum server stands in for the gateway so the adapter's real
//! HTTP path (token fetch, caching, push body, error mapping) is exercised.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use consultancy_portal::adapters::mpesa::{MpesaGateway, MpesaGatewayConfig};
use consultancy_portal::domain::payment::{PaymentFlow, PhoneNumber};
use consultancy_portal::ports::{GatewayError, PaymentGateway, StkPushRequest};

// =============================================================================
// Fake gateway
// =============================================================================

#[derive(Clone, Copy)]
enum PushMode {
    Accept,
    Decline,
    ServerError,
}

#[derive(Default)]
struct Recorded {
    token_calls: usize,
    basic_auth: Vec<String>,
    pushes: Vec<Value>,
    bearer: Vec<String>,
}

#[derive(Clone)]
struct FakeDaraja {
    recorded: Arc<Mutex<Recorded>>,
    token_status: StatusCode,
    push_mode: PushMode,
}

async fn token(State(fake): State<FakeDaraja>, headers: HeaderMap) -> impl IntoResponse {
    {
        let mut recorded = fake.recorded.lock().unwrap();
        recorded.token_calls += 1;
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            recorded.basic_auth.push(value.to_str().unwrap().to_string());
        }
    }
    if !fake.token_status.is_success() {
        return (fake.token_status, Json(json!({ "errorMessage": "Invalid credentials" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "access_token": "fake-token", "expires_in": "3599" })),
    )
}

async fn push(
    State(fake): State<FakeDaraja>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    {
        let mut recorded = fake.recorded.lock().unwrap();
        recorded.pushes.push(body);
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            recorded.bearer.push(value.to_str().unwrap().to_string());
        }
    }
    match fake.push_mode {
        PushMode::Accept => (
            StatusCode::OK,
            Json(json!({
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResponseCode": "0",
                "ResponseDescription": "Success. Request accepted for processing",
                "CustomerMessage": "Success. Request accepted for processing"
            })),
        ),
        PushMode::Decline => (
            StatusCode::OK,
            Json(json!({
                "MerchantRequestID": "29115-34620561-2",
                "CheckoutRequestID": "",
                "ResponseCode": "1",
                "ResponseDescription": "Rejected",
                "CustomerMessage": "Rejected"
            })),
        ),
        PushMode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "errorMessage": "Internal Server Error" })),
        ),
    }
}

async fn start_fake(token_status: StatusCode, push_mode: PushMode) -> (String, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let fake = FakeDaraja {
        recorded: recorded.clone(),
        token_status,
        push_mode,
    };
    let app = Router::new()
        .route("/oauth/v1/generate", get(token))
        .route("/mpesa/stkpush/v1/processrequest", post(push))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), recorded)
}

fn gateway(base_url: String) -> MpesaGateway {
    MpesaGateway::new(MpesaGatewayConfig {
        base_url,
        consumer_key: SecretString::new("consumer".to_string()),
        consumer_secret: SecretString::new("secret".to_string()),
        shortcode: "174379".to_string(),
        passkey: SecretString::new("passkey".to_string()),
        till_number: Some("5551234".to_string()),
        callback_base_url: "https://portal.example.com".to_string(),
        timeout: Duration::from_secs(5),
        token_refresh_margin: Duration::from_secs(60),
    })
    .unwrap()
}

fn request(flow: PaymentFlow, reference: &str) -> StkPushRequest {
    StkPushRequest {
        phone: PhoneNumber::parse("0712345678").unwrap(),
        amount: 1500,
        account_reference: reference.to_string(),
        description: "Payment".to_string(),
        flow,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn invoice_push_sends_pay_bill_request() {
    let (base_url, recorded) = start_fake(StatusCode::OK, PushMode::Accept).await;
    let gateway = gateway(base_url);

    let response = gateway
        .initiate_push(request(PaymentFlow::Invoice, "INV-2024-0042"))
        .await
        .unwrap();

    assert!(response.is_accepted());
    assert_eq!(response.checkout_request_id, "ws_CO_191220191020363925");

    let recorded = recorded.lock().unwrap();
    let expected_basic = format!("Basic {}", STANDARD.encode("consumer:secret"));
    assert_eq!(recorded.basic_auth, vec![expected_basic]);
    assert_eq!(recorded.bearer, vec!["Bearer fake-token".to_string()]);

    let body = &recorded.pushes[0];
    assert_eq!(body["BusinessShortCode"], json!("174379"));
    assert_eq!(body["TransactionType"], json!("CustomerPayBillOnline"));
    assert_eq!(body["PartyA"], json!("254712345678"));
    assert_eq!(body["PartyB"], json!("174379"));
    assert_eq!(body["PhoneNumber"], json!("254712345678"));
    assert_eq!(body["Amount"], json!(1500));
    assert_eq!(body["AccountReference"], json!("INV-2024-0042"));
    assert_eq!(
        body["CallBackURL"],
        json!("https://portal.example.com/api/webhooks/mpesa/invoices")
    );

    let timestamp = body["Timestamp"].as_str().unwrap();
    assert_eq!(timestamp.len(), 14);
    let password = STANDARD.decode(body["Password"].as_str().unwrap()).unwrap();
    assert_eq!(
        String::from_utf8(password).unwrap(),
        format!("174379passkey{}", timestamp)
    );
}

#[tokio::test]
async fn donation_push_uses_buy_goods_and_till() {
    let (base_url, recorded) = start_fake(StatusCode::OK, PushMode::Accept).await;
    let gateway = gateway(base_url);

    gateway
        .initiate_push(request(PaymentFlow::Donation, "DON-1704067200000"))
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    let body = &recorded.pushes[0];
    assert_eq!(body["TransactionType"], json!("CustomerBuyGoodsOnline"));
    assert_eq!(body["PartyB"], json!("5551234"));
    assert_eq!(
        body["CallBackURL"],
        json!("https://portal.example.com/api/webhooks/mpesa/donations")
    );
}

#[tokio::test]
async fn token_is_reused_across_pushes() {
    let (base_url, recorded) = start_fake(StatusCode::OK, PushMode::Accept).await;
    let gateway = gateway(base_url);

    for _ in 0..3 {
        gateway
            .initiate_push(request(PaymentFlow::Invoice, "INV-2024-0042"))
            .await
            .unwrap();
    }

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.token_calls, 1);
    assert_eq!(recorded.pushes.len(), 3);
}

#[tokio::test]
async fn declined_push_is_returned_not_raised() {
    let (base_url, _) = start_fake(StatusCode::OK, PushMode::Decline).await;
    let gateway = gateway(base_url);

    let response = gateway
        .initiate_push(request(PaymentFlow::Invoice, "INV-2024-0042"))
        .await
        .unwrap();

    assert_eq!(response.response_code, "1");
    assert!(!response.is_accepted());
}

#[tokio::test]
async fn server_error_maps_to_rejected() {
    let (base_url, _) = start_fake(StatusCode::OK, PushMode::ServerError).await;
    let gateway = gateway(base_url);

    let err = gateway
        .initiate_push(request(PaymentFlow::Invoice, "INV-2024-0042"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Rejected { status: 500, .. }));
}

#[tokio::test]
async fn failed_token_request_is_an_auth_error() {
    let (base_url, recorded) = start_fake(StatusCode::UNAUTHORIZED, PushMode::Accept).await;
    let gateway = gateway(base_url);

    let err = gateway
        .initiate_push(request(PaymentFlow::Invoice, "INV-2024-0042"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Auth(_)));
    assert!(recorded.lock().unwrap().pushes.is_empty());
}
