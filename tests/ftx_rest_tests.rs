use ftx_rest::core::kernel::{hmac_sha256_hex, ReqwestRest};
use ftx_rest::exchanges::ftx::signature_payload;
use ftx_rest::{
    to_decimal, ErrorKind, ExchangeConfig, ExchangeError, FtxBuilder, FtxRest, NumericPolicy,
};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const API_KEY: &str = "test-key";
const API_SECRET: &str = "test-secret";

fn fixed_clock() -> Result<u64, ExchangeError> {
    Ok(1000)
}

/// Public-only client pointed at the mock server
fn public_client(server: &MockServer) -> FtxRest<ReqwestRest> {
    FtxBuilder::new()
        .with_base_url(server.base_url())
        .build()
        .unwrap()
}

/// Signed client with a fixed clock so signatures are predictable
fn signed_client(server: &MockServer) -> FtxRest<ReqwestRest> {
    FtxBuilder::new()
        .with_base_url(server.base_url())
        .with_credentials(API_KEY.to_string(), API_SECRET.to_string())
        .with_clock(fixed_clock)
        .build()
        .unwrap()
}

#[cfg(test)]
mod fetch_tests {
    use super::*;

    #[tokio::test]
    async fn test_public_markets_returns_result_unchanged() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/markets");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"success":true,"result":[{"name":"BTC-PERP"},{"name":"ETH-PERP"}]}"#);
            })
            .await;

        let result = public_client(&server).fetch("markets", &[]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, json!([{"name": "BTC-PERP"}, {"name": "ETH-PERP"}]));
    }

    #[tokio::test]
    async fn test_authenticated_get_signs_path_and_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/orders")
                    .query_param("market", "BTC-PERP")
                    .header("ftx-key", API_KEY)
                    .header("ftx-ts", "1000")
                    .header(
                        "ftx-sign",
                        "dc85be6ada1db876e06dab6449f7b46024b0c3db416868dad887c9d903467edd",
                    );
                then.status(200)
                    .json_body(json!({"success": true, "result": [{"id": 7}]}));
            })
            .await;

        let result = signed_client(&server)
            .fetch_authenticated("orders", &[("market", "BTC-PERP")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, json!([{"id": 7}]));
    }

    #[tokio::test]
    async fn test_subaccount_header_is_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/account")
                    .header("ftx-subaccount", "alpha");
                then.status(200)
                    .json_body(json!({"success": true, "result": {"username": "alpha"}}));
            })
            .await;

        let ftx = FtxBuilder::new()
            .with_base_url(server.base_url())
            .with_credentials(API_KEY.to_string(), API_SECRET.to_string())
            .with_subaccount("alpha".to_string())
            .build()
            .unwrap();
        let result = ftx.fetch_authenticated("account", &[]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["username"], "alpha");
    }

    #[tokio::test]
    async fn test_typed_fetch() {
        #[derive(Debug, serde::Deserialize)]
        struct Market {
            name: String,
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets/BTC-PERP");
                then.status(200)
                    .json_body(json!({"success": true, "result": {"name": "BTC-PERP"}}));
            })
            .await;

        let market: Market = public_client(&server)
            .fetch_json("markets/BTC-PERP", &[])
            .await
            .unwrap();
        assert_eq!(market.name, "BTC-PERP");
    }
}

#[cfg(test)]
mod body_tests {
    use super::*;

    #[tokio::test]
    async fn test_post_signs_transmitted_bytes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .header("content-type", "application/json")
                    .header("ftx-ts", "1000")
                    .header(
                        "ftx-sign",
                        "245dccf41380de63826a405c712ab0ae463fde643fe3f19f660bf3a81d82f1a7",
                    )
                    .body(r#"{"market":"BTC-PERP","size":1}"#);
                then.status(200)
                    .json_body(json!({"success": true, "result": {"id": 42}}));
            })
            .await;

        let result = signed_client(&server)
            .post("orders", &json!({"market": "BTC-PERP", "size": 1}), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["id"], 42);
    }

    #[tokio::test]
    async fn test_reordered_body_changes_signature() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .header(
                        "ftx-sign",
                        "fa46ebf0b53d15b84b53e03181f6ec1ca6375cafba1f862c16d382c145fe04c5",
                    )
                    .body(r#"{"size":1,"market":"BTC-PERP"}"#);
                then.status(200)
                    .json_body(json!({"success": true, "result": {"id": 43}}));
            })
            .await;

        let result = signed_client(&server)
            .post("orders", &json!({"size": 1, "market": "BTC-PERP"}), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["id"], 43);
    }

    #[tokio::test]
    async fn test_post_signs_query_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .query_param("market", "BTC-PERP")
                    .header("ftx-ts", "1000")
                    .header(
                        "ftx-sign",
                        "e9ee1dd7d556e97f287c1e8e010cd24362905a4350f847d12cdb26177d275398",
                    )
                    .body(r#"{"size":1}"#);
                then.status(200)
                    .json_body(json!({"success": true, "result": {"id": 44}}));
            })
            .await;

        let result = signed_client(&server)
            .post("orders", &json!({"size": 1}), &[("market", "BTC-PERP")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["id"], 44);
    }

    #[tokio::test]
    async fn test_server_recomputes_signature_from_received_request() {
        let received = Arc::new(Mutex::new(None::<Vec<u8>>));
        let recorder = Arc::clone(&received);

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(move |when, then| {
                when.method(DELETE).path("/orders").is_true(move |req| {
                    let header = |name: &str| {
                        req.headers_vec()
                            .iter()
                            .find(|(key, _)| key.eq_ignore_ascii_case(name))
                            .map(|(_, value)| value.clone())
                    };
                    let (Some(ts), Some(signature)) = (header("ftx-ts"), header("ftx-sign"))
                    else {
                        return false;
                    };
                    let Ok(ts) = ts.parse::<u64>() else {
                        return false;
                    };

                    let uri = req.uri();
                    let body = req.body_ref();
                    let payload = signature_payload(
                        ts,
                        req.method_str(),
                        uri.path(),
                        uri.query().unwrap_or(""),
                        (!body.is_empty()).then_some(body),
                    );
                    let expected = hmac_sha256_hex(API_SECRET.as_bytes(), &payload).unwrap();
                    *recorder.lock().unwrap() = Some(payload);
                    expected == signature
                });
                then.status(200).json_body(
                    json!({"success": true, "result": "Orders queued for cancellation"}),
                );
            })
            .await;

        // wall clock, so the timestamp is only known to the server
        let ftx = FtxBuilder::new()
            .with_base_url(server.base_url())
            .with_credentials(API_KEY.to_string(), API_SECRET.to_string())
            .build()
            .unwrap();
        ftx.delete(
            "orders",
            Some(&json!({"market": "BTC-PERP"})),
            &[("market", "BTC-PERP")],
        )
        .await
        .unwrap();

        mock.assert_async().await;
        let payload = received.lock().unwrap().clone().unwrap();
        let payload = String::from_utf8(payload).unwrap();
        assert!(payload.ends_with(r#"DELETE/api/orders?market=BTC-PERP{"market":"BTC-PERP"}"#));
        assert!(payload
            .trim_end_matches(r#"DELETE/api/orders?market=BTC-PERP{"market":"BTC-PERP"}"#)
            .chars()
            .all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_delete_with_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/orders")
                    .header(
                        "ftx-sign",
                        "9b914cfff877d47dcffe2d48cbaa7ebf6d035199bf34e8fd0f3f30196b030cbb",
                    )
                    .body(r#"{"market":"BTC-PERP"}"#);
                then.status(200).json_body(
                    json!({"success": true, "result": "Orders queued for cancellation"}),
                );
            })
            .await;

        let result = signed_client(&server)
            .delete("orders", Some(&json!({"market": "BTC-PERP"})), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, json!("Orders queued for cancellation"));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_failure_envelope_is_application_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/orders");
                then.status(400)
                    .body(r#"{"success":false,"error":"Invalid parameter"}"#);
            })
            .await;

        let err = signed_client(&server)
            .post("orders", &json!({"market": "BTC-PERP", "size": -1}), &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.application_message(), Some("Invalid parameter"));
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("POST orders"));
    }

    #[tokio::test]
    async fn test_non_json_error_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets");
                then.status(503).body("Service Unavailable");
            })
            .await;

        let err = public_client(&server).fetch("markets", &[]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), Some(503));
        match err {
            ExchangeError::Transport { body, endpoint, .. } => {
                assert_eq!(body, "Service Unavailable");
                assert_eq!(endpoint, "markets");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_protocol_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = public_client(&server).fetch("markets", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_authenticated_call_without_credentials_is_precondition_error() {
        let server = MockServer::start_async().await;

        let err = public_client(&server)
            .fetch_authenticated("orders", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = public_client(&server)
            .post("orders", &json!({"market": "BTC-PERP"}), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let ftx = FtxBuilder::new()
            .with_config(ExchangeConfig::read_only().base_url("http://127.0.0.1:1".to_string()))
            .build()
            .unwrap();

        let err = ftx.fetch("markets", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    const PRICE_BODY: &str = r#"{"success":true,"result":{"price":29150.123456789012345}}"#;

    #[tokio::test]
    async fn test_decimal_policy_keeps_exact_prices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets/BTC-PERP");
                then.status(200).body(PRICE_BODY);
            })
            .await;

        let ftx = FtxBuilder::new()
            .with_base_url(server.base_url())
            .with_numeric_policy(NumericPolicy::Decimal)
            .build()
            .unwrap();
        let result = ftx.fetch("markets/BTC-PERP", &[]).await.unwrap();

        assert_eq!(
            to_decimal(&result["price"]),
            Some(Decimal::from_str("29150.123456789012345").unwrap())
        );
    }

    #[tokio::test]
    async fn test_decimal_policy_fills_typed_decimal_fields() {
        #[derive(Debug, serde::Deserialize)]
        struct Quote {
            price: Decimal,
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets/BTC-PERP");
                then.status(200).body(PRICE_BODY);
            })
            .await;

        let ftx = FtxBuilder::new()
            .with_base_url(server.base_url())
            .with_numeric_policy(NumericPolicy::Decimal)
            .build()
            .unwrap();
        let quote: Quote = ftx.fetch_json("markets/BTC-PERP", &[]).await.unwrap();

        assert_eq!(
            quote.price,
            Decimal::from_str("29150.123456789012345").unwrap()
        );
    }

    #[tokio::test]
    async fn test_float_policy_rounds_prices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets/BTC-PERP");
                then.status(200).body(PRICE_BODY);
            })
            .await;

        let result = public_client(&server)
            .fetch("markets/BTC-PERP", &[])
            .await
            .unwrap();

        assert_eq!(
            result["price"].as_f64(),
            Some("29150.123456789012345".parse::<f64>().unwrap())
        );
        assert_ne!(
            to_decimal(&result["price"]),
            Some(Decimal::from_str("29150.123456789012345").unwrap())
        );
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn test_concurrent_calls_on_one_client() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/markets");
                then.status(200).json_body(json!({"success": true, "result": []}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/orders").header_exists("ftx-sign");
                then.status(200).json_body(json!({"success": true, "result": []}));
            })
            .await;

        let ftx = signed_client(&server);
        let public = (0..4).map(|_| ftx.fetch("markets", &[]));
        let private = (0..4).map(|_| ftx.fetch_authenticated("orders", &[]));

        let (public, private) = tokio::join!(join_all(public), join_all(private));

        assert!(public.iter().chain(private.iter()).all(Result::is_ok));
    }
}
