//! # Traffic Layer Benchmarks
//!
//! | Component | Path measured |
//! |-----------|---------------|
//! | Query cost estimator | `estimate` on wide and deep selection trees |
//! | Entity loader | `load_many` through one batch, duplicates included |
//! | Admission controller | `check` over the in-memory counter store |

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ql_01_window_counter::InMemoryCounterStore;
use ql_02_admission::{AdmissionConfig, AdmissionController, AdmissionRequest, QuotaRule, ScopeQuota};
use ql_03_query_cost::{
    ArgValue, CostConfig, Field, FragmentDefinition, QueryCostEstimator, QueryDocument, Selection,
    Variables,
};
use ql_04_entity_loader::{BatchFetch, EntityLoader, FetchError, LoaderConfig};
use rand::Rng;
use shared_types::OperationKind;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Query cost estimation
// ============================================================================

/// `width` sibling connections, each nested `depth` levels.
fn selection_tree(width: usize, depth: usize) -> QueryDocument {
    fn nested(level: usize, depth: usize) -> Selection {
        let field = Field::new(format!("level{level}")).arg("first", ArgValue::Int(20));
        if level == depth {
            field.select(vec![Selection::field("id"), Selection::spread("Meta")]).into()
        } else {
            field
                .select(vec![Selection::field("id"), nested(level + 1, depth)])
                .into()
        }
    }

    let roots = (0..width).map(|_| nested(1, depth)).collect();
    QueryDocument::query(roots).with_fragment(FragmentDefinition::new(
        "Meta",
        "Node",
        vec![Selection::field("createdAt"), Selection::field("__typename")],
    ))
}

fn bench_cost_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ql-03-query-cost");
    let estimator = QueryCostEstimator::new(CostConfig::default());
    let vars = Variables::new();

    for (width, depth) in [(1, 5), (10, 5), (50, 8), (200, 3)] {
        let doc = selection_tree(width, depth);
        group.throughput(Throughput::Elements((width * depth) as u64));
        group.bench_with_input(
            BenchmarkId::new("estimate", format!("{width}x{depth}")),
            &doc,
            |b, doc| b.iter(|| black_box(estimator.estimate(doc, &vars))),
        );
    }

    group.finish();
}

// ============================================================================
// Entity loader batching
// ============================================================================

struct ConstStorage;

#[async_trait]
impl BatchFetch for ConstStorage {
    type Key = u64;
    type Value = u64;

    async fn fetch(&self, keys: &[u64]) -> Result<HashMap<u64, u64>, FetchError> {
        Ok(keys.iter().map(|k| (*k, k * 2)).collect())
    }
}

fn bench_loader(c: &mut Criterion) {
    let mut group = c.benchmark_group("ql-04-entity-loader");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");

    for keys in [10usize, 100, 1_000] {
        let mut rng = rand::thread_rng();
        // Roughly half the loads repeat a key already requested.
        let requested: Vec<u64> = (0..keys).map(|_| rng.gen_range(0..(keys as u64 / 2 + 1))).collect();
        let loader = EntityLoader::new(
            ConstStorage,
            LoaderConfig {
                max_batch_size: 100,
                batch_wait: Duration::ZERO,
            },
        );

        group.throughput(Throughput::Elements(keys as u64));
        group.bench_with_input(
            BenchmarkId::new("load_many", keys),
            &requested,
            |b, requested| {
                b.iter(|| runtime.block_on(async { black_box(loader.load_many(requested).await) }))
            },
        );
    }

    group.finish();
}

// ============================================================================
// Admission checks
// ============================================================================

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("ql-02-admission");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");

    let generous = ScopeQuota {
        short: Some(QuotaRule::per_second(u64::MAX)),
        long: None,
    };
    let config = AdmissionConfig {
        global: generous,
        origin: generous,
        identity: generous,
        read: generous,
        write: generous,
        resource: generous,
        ..AdmissionConfig::default()
    };
    let controller = AdmissionController::new(Arc::new(InMemoryCounterStore::new()), config);

    let mut next_origin = 0u32;
    group.bench_function("check_distinct_origins", |b| {
        b.iter(|| {
            next_origin = next_origin.wrapping_add(1);
            let origin = IpAddr::V4(Ipv4Addr::from(next_origin));
            let request = AdmissionRequest::new(origin, OperationKind::Read);
            runtime.block_on(async { black_box(controller.check(&request).await.is_ok()) })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_cost_estimation, bench_loader, bench_admission);
criterion_main!(benches);
