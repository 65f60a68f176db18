//! Dispatch benchmark suite.
//!
//! Measures the request path at two levels:
//! - Envelope decode/encode
//! - Full round trip through a running endpoint over the in-memory transport
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use ws_rpc_endpoint::transport::{MemoryPeer, MemoryTransport};
use ws_rpc_endpoint::{
    ConnectionState, CorrelationId, Endpoint, ProcedureError, RequestEnvelope, ResponseEnvelope,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PARAM_COUNTS: &[usize] = &[0, 8, 64];

const ROUND_TRIP_REQUESTS: &[(&str, &str)] = &[
    ("fn", r#"{"id":"b1","action":"sum","params":[1,2,3,4]}"#),
    ("async", r#"{"id":"b2","action":"sumAsync","params":[1,2,3,4]}"#),
    ("not_found", r#"{"id":"b3","action":"missing","params":[]}"#),
    ("discovery", r#"{"id":"b4","action":"getRegisteredMethods","params":[]}"#),
];

// ============================================================================
// Setup
// ============================================================================

fn sum(params: &[Value]) -> Result<Value, ProcedureError> {
    Ok(json!(params.iter().filter_map(Value::as_i64).sum::<i64>()))
}

/// Starts an endpoint on the memory transport and returns its open peer.
async fn connected_endpoint() -> (Endpoint, MemoryPeer) {
    let (transport, mut server) = MemoryTransport::new();
    let endpoint = Endpoint::builder()
        .address("ws://memory/ws")
        .transport(transport)
        .without_heartbeat()
        .build()
        .expect("build endpoint");

    endpoint
        .register_fn("sum", |params| sum(&params.into_inner()))
        .register_async("sumAsync", |params| async move { sum(&params.into_inner()) });
    endpoint.start();

    let peer = server.accept().await.expect("connection attempt");
    peer.open();
    endpoint
        .wait_until(ConnectionState::Connected)
        .await
        .expect("connected");

    (endpoint, peer)
}

// ============================================================================
// Benchmark: Envelopes
// ============================================================================

fn bench_envelopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");

    for &count in PARAM_COUNTS {
        let request = RequestEnvelope::new(
            CorrelationId::new("bench"),
            "sum",
            (0..count).map(|i| json!(i)).collect(),
        )
        .encode()
        .expect("encode request");

        group.throughput(Throughput::Bytes(request.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", count), &request, |b, text| {
            b.iter(|| RequestEnvelope::decode(text).expect("decode"));
        });
    }

    let response = ResponseEnvelope::ok(CorrelationId::new("bench"), json!({"value": [1, 2, 3]}));
    group.bench_function("encode_response", |b| {
        b.iter(|| response.encode().expect("encode"));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Round Trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let (endpoint, peer) = rt.block_on(connected_endpoint());
    let peer = Arc::new(Mutex::new(peer));

    let mut group = c.benchmark_group("round_trip");

    for &(name, request) in ROUND_TRIP_REQUESTS {
        group.bench_with_input(BenchmarkId::new("call", name), &request, |b, &request| {
            b.to_async(&rt).iter(|| {
                let peer = Arc::clone(&peer);
                async move {
                    let mut peer = peer.lock().await;
                    peer.send_text(request);
                    peer.recv_text().await.expect("response")
                }
            });
        });
    }

    group.finish();

    endpoint.stop();
    let _ = rt.block_on(endpoint.join());
}

criterion_group!(benches, bench_envelopes, bench_round_trip);
criterion_main!(benches);
