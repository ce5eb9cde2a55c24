//! Integration tests for qka-client
//!
//! These tests spin up a real gateway and use the client to call it, which
//! keeps the client and the dispatcher's wire format in sync.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use qka_api::{create_router, AppState};
use qka_client::testing::TestServer;
use qka_client::{BarsRequest, DownloadRequest, QkaClient, QkaClientError};
use qka_core::{
    operation_fn, Arguments, FunctionRegistry, InvocationError, OperationBuilder, ParamType,
    Returned, Series, StaticCredential, Table, MAX_DEPTH,
};
use serde_json::{json, Value};
use tokio::sync::Barrier;

const TOKEN: &str = "integration-token";

// =============================================================================
// Test Gateway
// =============================================================================

/// Collaborator stand-in recording every invocation it receives
#[derive(Default, Clone)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    fn record(&self, op: &str, args: Arguments) {
        self.calls
            .lock()
            .unwrap()
            .push((op.to_string(), Value::Object(args.into_map())));
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

fn gateway_registry(recorder: &Recorder) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();

    let r = recorder.clone();
    registry.register(
        OperationBuilder::new("op")
            .param("a", ParamType::Integer)
            .param_or("b", ParamType::String, "x")
            .param_or("flag", ParamType::Boolean, false),
        operation_fn(move |args| {
            let r = r.clone();
            async move {
                r.record("op", args);
                Ok::<_, InvocationError>(Returned::Null)
            }
        }),
    );

    registry.register(
        OperationBuilder::new("fails"),
        operation_fn(|_| async { Err::<Returned, _>(InvocationError::new("bad input")) }),
    );

    registry.register(
        OperationBuilder::new("quotes"),
        operation_fn(|_| async {
            let table = Table::new(["code", "open", "close"])
                .with_row(vec![Returned::from("600000.SH"), 8.1.into(), 8.3.into()])
                .with_row(vec![Returned::from("000001.SZ"), 10.0.into(), 9.9.into()]);
            Ok::<_, InvocationError>(table.into())
        }),
    );

    registry.register(
        OperationBuilder::new("closes"),
        operation_fn(|_| async {
            Ok::<_, InvocationError>(Series::new("close", [3.0, 4.5, 5.25]).into())
        }),
    );

    let r = recorder.clone();
    registry.register(
        OperationBuilder::new("download_stock_history_data")
            .param("stock_list", ParamType::Sequence)
            .param("start_time", ParamType::String)
            .param_or("end_time", ParamType::String, "")
            .param_or("period", ParamType::String, "1d")
            .param_or("process_bar", ParamType::Boolean, true),
        operation_fn(move |args| {
            let r = r.clone();
            async move {
                r.record("download_stock_history_data", args);
                Ok::<_, InvocationError>(Returned::Bool(true))
            }
        }),
    );

    registry.register(
        OperationBuilder::new("get_daily_bars")
            .param("stock_list", ParamType::Sequence)
            .param_or("period", ParamType::String, "1d")
            .param_or("start_time", ParamType::String, "")
            .param_or("end_time", ParamType::String, "")
            .param_or("count", ParamType::Integer, -1),
        operation_fn(|args| async move {
            let codes: Vec<String> = args.get("stock_list")?;
            let mut out = Vec::new();
            for code in codes {
                let table = Table::new(["time", "open", "high", "low", "close", "volume", "amount"])
                    .with_row(vec![
                        Returned::from(1_704_067_200_000i64),
                        10.0.into(),
                        10.5.into(),
                        9.8.into(),
                        10.2.into(),
                        120_000.0.into(),
                        1_224_000.0.into(),
                    ]);
                out.push((code, Returned::from(table)));
            }
            Ok::<_, InvocationError>(Returned::map(out))
        }),
    );

    registry
}

async fn start(registry: FunctionRegistry) -> TestServer {
    let credential = Arc::new(StaticCredential::new(TOKEN).unwrap());
    let state = AppState::from_registry(registry, credential).unwrap();
    TestServer::start(create_router(state), TOKEN).await.unwrap()
}

// =============================================================================
// Envelope handling
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = start(FunctionRegistry::new()).await;
    assert_eq!(server.client.health().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_wrong_token_raises_auth_error() {
    let recorder = Recorder::default();
    let server = start(gateway_registry(&recorder)).await;

    let intruder = server.client_with_token("wrong").unwrap();
    let err = intruder.call("op", json!({"a": 1})).await.unwrap_err();

    assert!(matches!(err, QkaClientError::Auth(_)), "got {:?}", err);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_collaborator_error_carries_exact_detail() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let err = server.client.call("fails", json!({})).await.unwrap_err();
    match err {
        QkaClientError::Remote { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "bad input");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_operation_is_not_found() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let err = server.client.call("nope", json!({})).await.unwrap_err();
    assert!(matches!(err, QkaClientError::NotFound(_)));
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_missing_parameter_is_validation_error() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let err = server.client.call("op", json!({})).await.unwrap_err();
    assert_eq!(err.detail(), Some("missing required parameter(s) for op: a"));
    assert!(matches!(err, QkaClientError::Validation(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let server = start(FunctionRegistry::new()).await;
    let url = server.base_url();
    server.shutdown().await;

    let client = QkaClient::with_config(
        &url,
        TOKEN,
        Duration::from_millis(500),
        Duration::from_millis(500),
    )
    .unwrap();
    let err = client.call("op", json!({})).await.unwrap_err();
    assert!(matches!(err, QkaClientError::Transport(_)), "got {:?}", err);
    assert!(!err.is_remote());
}

#[tokio::test]
async fn test_non_envelope_error_is_transport_error() {
    let server = start(gateway_registry(&Recorder::default())).await;

    // No route matches, so the body is not an envelope
    let err = server.client.call("a/b", json!({})).await.unwrap_err();
    match &err {
        QkaClientError::Transport(msg) => assert!(msg.starts_with("HTTP 404"), "got {}", msg),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(!err.is_remote());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let registry = FunctionRegistry::new().with(
        OperationBuilder::new("slow"),
        operation_fn(|_| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, InvocationError>(Returned::Null)
        }),
    );
    let credential = Arc::new(StaticCredential::new(TOKEN).unwrap());
    let state = AppState::from_registry(registry, credential).unwrap();
    let server = TestServer::start_with_timeout(
        create_router(state),
        TOKEN,
        Duration::from_millis(200),
        Duration::from_millis(200),
    )
    .await
    .unwrap();

    let err = server.client.call("slow", json!({})).await.unwrap_err();
    assert!(matches!(err, QkaClientError::Transport(_)), "got {:?}", err);
}

// =============================================================================
// Binding and normalization
// =============================================================================

#[tokio::test]
async fn test_call_binds_supplied_plus_defaults_only() {
    let recorder = Recorder::default();
    let server = start(gateway_registry(&recorder)).await;

    let data = server.client.call("op", json!({"a": 1})).await.unwrap();
    assert_eq!(data, Value::Null);

    assert_eq!(
        recorder.calls(),
        vec![("op".to_string(), json!({"a": 1, "b": "x", "flag": false}))]
    );
}

#[tokio::test]
async fn test_table_normalized_to_records() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let data = server.client.call("quotes", json!({})).await.unwrap();
    assert_eq!(
        data,
        json!([
            {"code": "600000.SH", "open": 8.1, "close": 8.3},
            {"code": "000001.SZ", "open": 10.0, "close": 9.9},
        ])
    );
    let keys: Vec<_> = data[0].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys.len(), 3);
}

#[tokio::test]
async fn test_series_normalized_to_plain_list() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let closes: Vec<f64> = server.client.call_as("closes", json!({})).await.unwrap();
    assert_eq!(closes, vec![3.0, 4.5, 5.25]);
}

fn nested(levels: usize) -> Returned {
    let mut value = Returned::Int(7);
    for _ in 0..levels {
        value = Returned::Seq(vec![value]);
    }
    value
}

/// Number of array levels, plus the innermost value
fn unwrap_nested(mut value: &Value) -> (usize, &Value) {
    let mut levels = 0;
    while let Value::Array(items) = value {
        value = &items[0];
        levels += 1;
    }
    (levels, value)
}

#[tokio::test]
async fn test_deeply_nested_results_decode() {
    let registry = FunctionRegistry::new()
        .with(
            OperationBuilder::new("deepest"),
            operation_fn(|_| async { Ok::<_, InvocationError>(nested(MAX_DEPTH)) }),
        )
        .with(
            OperationBuilder::new("too_deep"),
            operation_fn(|_| async { Ok::<_, InvocationError>(nested(MAX_DEPTH + 100)) }),
        );
    let server = start(registry).await;

    let data = server.client.call("deepest", json!({})).await.unwrap();
    assert_eq!(unwrap_nested(&data), (MAX_DEPTH, &json!(7)));

    let data = server.client.call("too_deep", json!({})).await.unwrap();
    assert_eq!(
        unwrap_nested(&data),
        (MAX_DEPTH + 1, &json!("<nested too deep>"))
    );
}

#[tokio::test]
async fn test_records_follow_column_order() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let data = server.client.call("quotes", json!({})).await.unwrap();
    let keys: Vec<&str> = data[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["code", "open", "close"]);
}

#[tokio::test]
async fn test_list_operations() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let ops = server.client.list_operations().await.unwrap();
    let names: Vec<_> = ops.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["closes", "download_stock_history_data", "fails", "get_daily_bars", "op", "quotes"]
    );

    let op = ops.iter().find(|op| op.name == "op").unwrap();
    assert_eq!(op.parameter_names(), vec!["a", "b", "flag"]);
    assert_eq!(op.parameter("b").unwrap().default(), Some(&json!("x")));
}

// =============================================================================
// Convenience wrappers
// =============================================================================

#[tokio::test]
async fn test_download_wrapper_forwards_request() {
    let recorder = Recorder::default();
    let server = start(gateway_registry(&recorder)).await;

    let request = DownloadRequest::new(["000001.SZ", "600000.SH"], "20240101").process_bar(false);
    assert!(server.client.download_stock_history_data(&request).await.unwrap());

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        json!({
            "stock_list": ["000001.SZ", "600000.SH"],
            "start_time": "20240101",
            "end_time": "",
            "period": "1d",
            "process_bar": false,
        })
    );
}

#[tokio::test]
async fn test_daily_bars_wrapper() {
    let server = start(gateway_registry(&Recorder::default())).await;

    let bars = server
        .client
        .get_daily_bars(&BarsRequest::new(["000001.SZ"]).count(1))
        .await
        .unwrap();

    let rows = &bars["000001.SZ"];
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time, 1_704_067_200_000);
    assert_eq!(rows[0].close, 10.2);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_operations_run_concurrently() {
    // Each operation waits for the other to start; serial execution would deadlock
    let barrier = Arc::new(Barrier::new(2));
    let mut registry = FunctionRegistry::new();
    for name in ["left", "right"] {
        let barrier = barrier.clone();
        registry.register(
            OperationBuilder::new(name),
            operation_fn(move |_| {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    Ok::<_, InvocationError>(Returned::from(name))
                }
            }),
        );
    }
    let server = start(registry).await;

    let both = futures::future::join(
        server.client.call("left", json!({})),
        server.client.call("right", json!({})),
    );
    let (left, right) = tokio::time::timeout(Duration::from_secs(5), both)
        .await
        .expect("distinct operations blocked each other");

    assert_eq!(left.unwrap(), json!("left"));
    assert_eq!(right.unwrap(), json!("right"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serialized_operation_is_single_flight() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (a, p) = (active.clone(), peak.clone());
    let registry = FunctionRegistry::new().with(
        OperationBuilder::new("exclusive").serialized(),
        operation_fn(move |_| {
            let (a, p) = (a.clone(), p.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, InvocationError>(Returned::Bool(true))
            }
        }),
    );
    let server = start(registry).await;

    let calls = (0..4).map(|_| server.client.call("exclusive", json!({})));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}
