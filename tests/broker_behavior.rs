//! Behavior tests for the request broker.
//!
//! These verify the serialization guarantees: one upstream call sequence at
//! a time, submission-order processing, exactly one reply per request, and
//! per-request error scoping.

use std::time::Duration;

use topcoint_tests::*;

fn scripted_broker(client: Arc<ScriptedHttpClient>) -> RequestBroker {
    let upstream = scripted_upstream(client);
    let (broker, _worker) = RequestBroker::spawn(sample_directory(), DetailFetcher::new(upstream));
    broker
}

// =============================================================================
// Serialization and ordering
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn when_two_clients_submit_concurrently_upstream_calls_never_interleave() {
    // Given: a transport that holds every call open long enough for a
    // non-serialized pipeline to overlap
    let client = Arc::new(ScriptedHttpClient::with_delay(Duration::from_millis(20)));
    let broker = scripted_broker(client.clone());

    // When: two clients submit resolved lookups nearly simultaneously
    let first = {
        let broker = broker.clone();
        tokio::spawn(async move {
            let reply = broker
                .submit(Query::with_paging("BTC", 1, 10))
                .await
                .expect("broker accepts the request");
            reply.await.expect("reply must arrive")
        })
    };
    let second = {
        let broker = broker.clone();
        tokio::spawn(async move {
            let reply = broker
                .submit(Query::with_paging("ETH", 1, 10))
                .await
                .expect("broker accepts the request");
            reply.await.expect("reply must arrive")
        })
    };

    // Then: both receive exactly one reply each
    let first = first.await.expect("task completes");
    let second = second.await.expect("task completes");
    assert!(matches!(first, Response::Detail(_)));
    assert!(matches!(second, Response::Detail(_)));

    // And: the four upstream calls (metadata + stats per lookup) were
    // observed strictly one at a time
    assert_eq!(client.request_count(), 4);
    assert_eq!(client.max_in_flight(), 1);
}

#[tokio::test]
async fn when_requests_are_submitted_in_order_upstream_observes_the_same_order() {
    let client = Arc::new(ScriptedHttpClient::new());
    let broker = scripted_broker(client.clone());

    let btc_reply = broker
        .submit(Query::with_paging("BTC", 1, 10))
        .await
        .expect("broker accepts the request");
    let eth_reply = broker
        .submit(Query::with_paging("ETH", 1, 10))
        .await
        .expect("broker accepts the request");

    btc_reply.await.expect("first reply arrives");
    eth_reply.await.expect("second reply arrives");

    let requests = client.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[0].contains("assets=BTC"), "got {}", requests[0]);
    assert!(requests[1].contains("/asset/v1/top/list"));
    assert!(requests[2].contains("assets=ETH"), "got {}", requests[2]);
    assert!(requests[3].contains("/asset/v1/top/list"));
}

// =============================================================================
// Validation short-circuit
// =============================================================================

#[tokio::test]
async fn when_validation_fails_the_error_is_delivered_without_any_upstream_call() {
    let client = Arc::new(ScriptedHttpClient::new());
    let broker = scripted_broker(client.clone());

    let reply = broker
        .submit(Query::with_paging("BTC", 1, 50))
        .await
        .expect("broker accepts the request");
    let response = reply.await.expect("reply must arrive");

    assert_eq!(
        response,
        Response::Validation(ValidationError::PageSizeOutOfRange { got: 50 })
    );
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn when_the_query_has_no_exact_match_suggestions_come_from_the_directory_alone() {
    let client = Arc::new(ScriptedHttpClient::new());
    let broker = scripted_broker(client.clone());

    let reply = broker
        .submit(Query::suggestion("ET"))
        .await
        .expect("broker accepts the request");
    let response = reply.await.expect("reply must arrive");

    assert_eq!(
        response,
        Response::Suggestions {
            symbols: vec![
                AssetRecord::new("ETH", "Ethereum"),
                AssetRecord::new("ETC", "Ethereum Classic"),
            ],
        }
    );
    assert_eq!(client.request_count(), 0);
}

// =============================================================================
// Error scoping and abandoned replies
// =============================================================================

#[tokio::test]
async fn when_an_upstream_call_fails_only_that_request_sees_the_error() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_transport_error("connection refused");
    let broker = scripted_broker(client.clone());

    let failed = broker
        .submit(Query::with_paging("BTC", 1, 10))
        .await
        .expect("broker accepts the request");
    let response = failed.await.expect("reply must arrive");
    let Response::Upstream(error) = response else {
        panic!("transport failure must produce an upstream error response");
    };
    assert_eq!(
        error,
        UpstreamError::Transport(String::from("connection refused"))
    );

    // The broker keeps serving subsequent requests.
    let next = broker
        .submit(Query::suggestion("ET"))
        .await
        .expect("broker still accepts requests");
    let response = next.await.expect("reply must arrive");
    assert!(matches!(response, Response::Suggestions { .. }));
}

#[tokio::test]
async fn when_a_client_abandons_its_reply_the_broker_keeps_processing() {
    let client = Arc::new(ScriptedHttpClient::new());
    let broker = scripted_broker(client.clone());

    // A session that disconnects while its request is queued: the reply
    // channel is dropped before delivery.
    let abandoned = broker
        .submit(Query::with_paging("BTC", 1, 10))
        .await
        .expect("broker accepts the request");
    drop(abandoned);

    let survivor = broker
        .submit(Query::suggestion("Bit"))
        .await
        .expect("broker accepts the request");
    let response = survivor.await.expect("reply must arrive");

    assert_eq!(
        response,
        Response::Suggestions {
            symbols: vec![AssetRecord::new("BTC", "Bitcoin")],
        }
    );
    // The abandoned request was still processed normally.
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn suggestion_replies_serialize_to_the_symbols_envelope() {
    let client = Arc::new(ScriptedHttpClient::new());
    let broker = scripted_broker(client);

    let reply = broker
        .submit(Query::suggestion("ET"))
        .await
        .expect("broker accepts the request");
    let response = reply.await.expect("reply must arrive");

    let json = serde_json::to_value(response).expect("must serialize");
    assert_eq!(
        json,
        serde_json::json!({"symbols": [
            {"symbol": "ETH", "name": "Ethereum"},
            {"symbol": "ETC", "name": "Ethereum Classic"},
        ]})
    );
}

#[tokio::test]
async fn when_every_handle_is_dropped_the_worker_exits() {
    let client = Arc::new(ScriptedHttpClient::new());
    let upstream = scripted_upstream(client);
    let (broker, worker) = RequestBroker::spawn(sample_directory(), DetailFetcher::new(upstream));

    drop(broker);
    worker.await.expect("worker shuts down cleanly");
}
