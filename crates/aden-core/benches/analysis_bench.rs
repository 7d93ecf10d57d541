//! Criterion benchmarks for aden-core.
//!
//! ## Benchmark groups
//!
//! 1. **thresholds**: profile derivation and full layered resolution.
//! 2. **attribution**: N-way table-combination attribution.
//! 3. **pipeline**: end-to-end analysis on synthetic schemas.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/aden-core/Cargo.toml
//! # Run only the pipeline group:
//! cargo bench --manifest-path crates/aden-core/Cargo.toml -- pipeline
//! ```

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use aden_core::analysis::production::attribute_production;
use aden_core::analysis::{analyze, AnalysisContext, AnalysisInput};
use aden_core::config::resolver::resolve_profile;
use aden_core::config::{ConfigDocument, MigrationThresholds, ThresholdResolver};
use aden_core::models::{
    Cardinality, DatabaseSchema, EntityModel, QueryKind, QueryPattern, QueryStoreAnalysis,
    Relationship, TableCombination,
};

// ---------------------------------------------------------------------------
// Synthetic data
// ---------------------------------------------------------------------------

/// A chain of `n` entities, each owning a collection of the next, with a
/// foreign key per link and one eager-loading pattern per entity.
fn synthetic_input(n: usize) -> AnalysisInput {
    let name = |i: usize| format!("Entity{i:04}");
    let table = |i: usize| format!("tbl_entity_{i:04}");

    let mut input = AnalysisInput::default();
    for i in 0..n {
        let mut entity = EntityModel::new(name(i)).with_table(table(i));
        if i + 1 < n {
            entity = entity.with_navigation("Children", name(i + 1), Cardinality::OneToMany);
            input.schema.relationships.push(Relationship::new(
                table(i + 1),
                "ParentId",
                table(i),
                "Id",
                Cardinality::ManyToOne,
            ));
        }
        input.entities.push(entity);
        input.query_patterns.push(
            QueryPattern::new(name(i), QueryKind::EagerLoading, (i % 80) as u64 + 1)
                .with_include("Children.Children"),
        );
        input.query_patterns.push(QueryPattern::new(name(i), QueryKind::Update, 3));
    }
    input.query_store = Some(synthetic_store(n));
    input
}

fn synthetic_store(n: usize) -> QueryStoreAnalysis {
    let table = |i: usize| format!("tbl_entity_{i:04}");
    let table_combinations = (0..n.saturating_sub(2))
        .map(|i| {
            TableCombination::new([table(i), table(i + 1), table(i + 2)], (i as u64 + 1) * 25, 0.0)
        })
        .collect();
    QueryStoreAnalysis {
        queries: vec![],
        table_combinations,
    }
}

// ---------------------------------------------------------------------------
// 1. Thresholds
// ---------------------------------------------------------------------------

fn bench_thresholds(c: &mut Criterion) {
    let mut group = c.benchmark_group("thresholds");

    group.bench_function("resolve_profile_enterprise", |b| {
        b.iter(|| resolve_profile(black_box(Some("enterprise"))).unwrap())
    });

    let resolver = ThresholdResolver::new()
        .profile("growth")
        .document(ConfigDocument::user(
            "~/.aden/config.json",
            r#"{"thresholds": {"highFrequencyThreshold": 70}}"#,
        ))
        .document(ConfigDocument::project(
            "aden.json",
            r#"{"medium-frequency-threshold": 12, "minimumScore": 10}"#,
        ))
        .env([("ADEN_THRESHOLDS_CO_ACCESS_THRESHOLD", "800")])
        .cli_args(["--thresholds.high-read-write-ratio=4.5"]);
    group.bench_function("resolve_all_layers", |b| {
        b.iter(|| black_box(&resolver).resolve().unwrap())
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Attribution
// ---------------------------------------------------------------------------

fn bench_attribution(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribution");

    for &n in &[50usize, 500, 2000] {
        let input = synthetic_input(n);
        let store = synthetic_store(n);
        group.bench_with_input(BenchmarkId::new("table_combinations", n), &n, |b, _| {
            b.iter_with_setup(
                || AnalysisContext::new(MigrationThresholds::default(), &input.entities, &BTreeMap::new()),
                |mut ctx| {
                    black_box(attribute_production(&mut ctx, &store));
                },
            );
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(std::time::Duration::from_secs(10));

    let thresholds = MigrationThresholds::default();
    for &n in &[10usize, 100, 1000] {
        let input = synthetic_input(n);
        group.bench_with_input(BenchmarkId::new("analyze", n), &input, |b, input| {
            b.iter(|| black_box(analyze(input, &thresholds)));
        });
    }

    let input = synthetic_input(200);
    group.bench_function("empty_schema_200", |b| {
        let stripped = AnalysisInput {
            schema: DatabaseSchema::default(),
            ..input.clone()
        };
        b.iter(|| black_box(analyze(&stripped, &thresholds)));
    });

    group.finish();
}

criterion_group!(benches, bench_thresholds, bench_attribution, bench_pipeline);
criterion_main!(benches);
