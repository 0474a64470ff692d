//! Tests for the HTTP accrual client against an in-process stub authority

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::Amount;

use domain_loyalty::{
    AccrualClientConfig, AccrualError, AccrualPort, AccrualStatus, HttpAccrualClient, OrderNumber,
};

async fn stub_order(Path(number): Path<String>) -> Response {
    match number.as_str() {
        "79927398713" => Json(json!({
            "order": number,
            "status": "PROCESSED",
            "accrual": 729.98
        }))
        .into_response(),
        "5553" => Json(json!({ "order": number, "status": "REGISTERED" })).into_response(),
        "12345678903" => StatusCode::NO_CONTENT.into_response(),
        "4561261212345467" => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "30")],
            "No more than 10 requests per minute allowed",
        )
            .into_response(),
        "2377225624" => (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "soon")]).into_response(),
        "6668" => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "18446744073709551615")],
        )
            .into_response(),
        "9278923470" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "7773" => "not json".into_response(),
        "9993" => Json(json!({ "order": "1115", "status": "PROCESSED", "accrual": 1 })).into_response(),
        "8888" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::NO_CONTENT.into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_stub() -> SocketAddr {
    let app = Router::new().route("/api/orders/:number", get(stub_order));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client() -> HttpAccrualClient {
    let addr = start_stub().await;
    // No scheme on purpose; the client adds http://
    let config = AccrualClientConfig::new(addr.to_string()).with_timeout(Duration::from_millis(500));
    HttpAccrualClient::new(config).unwrap()
}

fn number(raw: &str) -> OrderNumber {
    OrderNumber::parse(raw).unwrap()
}

#[tokio::test]
async fn test_processed_response() {
    let client = client().await;
    let info = client.fetch_accrual(&number("79927398713")).await.unwrap();

    assert_eq!(info.order, number("79927398713"));
    assert_eq!(info.status, AccrualStatus::Processed);
    assert_eq!(info.accrual, Some(Amount::new(dec!(729.98))));
}

#[tokio::test]
async fn test_registered_response_without_accrual() {
    let client = client().await;
    let info = client.fetch_accrual(&number("5553")).await.unwrap();

    assert_eq!(info.status, AccrualStatus::Registered);
    assert_eq!(info.accrual, None);
}

#[tokio::test]
async fn test_no_content_is_not_registered() {
    let client = client().await;
    let err = client.fetch_accrual(&number("12345678903")).await.unwrap_err();
    assert_eq!(err, AccrualError::OrderNotRegistered);
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let client = client().await;
    let err = client.fetch_accrual(&number("4561261212345467")).await.unwrap_err();
    assert_eq!(
        err,
        AccrualError::RateLimited {
            retry_after: Duration::from_secs(30)
        }
    );
}

#[tokio::test]
async fn test_rate_limit_with_garbled_header_uses_default() {
    let client = client().await;
    let err = client.fetch_accrual(&number("2377225624")).await.unwrap_err();
    assert_eq!(
        err,
        AccrualError::RateLimited {
            retry_after: Duration::from_secs(60)
        }
    );
}

#[tokio::test]
async fn test_huge_retry_after_is_capped() {
    let client = client().await;
    let err = client.fetch_accrual(&number("6668")).await.unwrap_err();
    assert_eq!(
        err,
        AccrualError::RateLimited {
            retry_after: Duration::from_secs(3600)
        }
    );
}

#[tokio::test]
async fn test_server_error_is_unexpected_response() {
    let client = client().await;
    let err = client.fetch_accrual(&number("9278923470")).await.unwrap_err();
    assert_eq!(err, AccrualError::UnexpectedResponse { status: 500 });
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let client = client().await;
    let err = client.fetch_accrual(&number("7773")).await.unwrap_err();
    assert!(matches!(err, AccrualError::Decode(_)));
}

#[tokio::test]
async fn test_response_for_another_order_is_decode_error() {
    let client = client().await;
    let err = client.fetch_accrual(&number("9993")).await.unwrap_err();
    assert!(matches!(err, AccrualError::Decode(_)));
}

#[tokio::test]
async fn test_slow_authority_times_out() {
    let client = client().await;
    let err = client.fetch_accrual(&number("8888")).await.unwrap_err();
    assert!(matches!(err, AccrualError::Transport(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpAccrualClient::new(AccrualClientConfig::new(format!("http://{}", addr))).unwrap();
    let err = client.fetch_accrual(&number("79927398713")).await.unwrap_err();
    assert!(matches!(err, AccrualError::Transport(_)));
}
