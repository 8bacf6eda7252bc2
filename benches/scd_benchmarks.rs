// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Performance benchmarks for coverings and the strategic coordination
//! protocol

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use dss_geo::{
    union_volumes_4d, Circle, CoveringConfig, Geometry, LatLng, Polygon, Volume3D, Volume4D,
};
use dss_models::{EntityId, Manager, OperationalIntentState, Ovn};
use dss_scd::{ImplicitSubscriptionParams, PutOperationalIntentParams, ScdConfig, ScdService};
use dss_storage::MemoryStore;

fn square(lat: f64, lng: f64, side_deg: f64) -> Geometry {
    Geometry::Polygon(Polygon::new(vec![
        LatLng::new(lat, lng),
        LatLng::new(lat + side_deg, lng),
        LatLng::new(lat + side_deg, lng + side_deg),
        LatLng::new(lat, lng + side_deg),
    ]))
}

fn volume(footprint: Geometry) -> Volume4D {
    let now = Utc::now();
    Volume4D::new(
        Volume3D::new(footprint, Some(0.0), Some(120.0)),
        Some(now + Duration::hours(1)),
        Some(now + Duration::hours(2)),
    )
}

fn params(manager: &Manager, extent: Volume4D, key: Vec<Ovn>) -> PutOperationalIntentParams {
    PutOperationalIntentParams {
        extents: vec![extent],
        key,
        state: OperationalIntentState::Accepted,
        uss_base_url: format!("https://{manager}.example.com"),
        subscription_id: None,
        new_subscription: Some(ImplicitSubscriptionParams {
            uss_base_url: format!("https://{manager}.example.com"),
            notify_for_constraints: false,
        }),
        requested_ovn_suffix: None,
    }
}

// ============================================================================
// Covering Benchmarks
// ============================================================================

fn bench_covering(c: &mut Criterion) {
    let mut group = c.benchmark_group("covering");
    let config = CoveringConfig::default();

    for side in [0.01, 0.05, 0.2] {
        let footprint = square(37.4, -122.1, side);
        group.bench_with_input(BenchmarkId::new("polygon", side), &footprint, |b, geom| {
            b.iter(|| black_box(geom.calculate_covering_with(&config).unwrap()))
        });
    }

    for radius in [100.0, 1_000.0, 10_000.0] {
        let footprint = Geometry::Circle(Circle::new(LatLng::new(37.4, -122.1), radius));
        group.bench_with_input(BenchmarkId::new("circle", radius), &footprint, |b, geom| {
            b.iter(|| black_box(geom.calculate_covering_with(&config).unwrap()))
        });
    }

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    let config = CoveringConfig::default();

    for n in [1usize, 10, 50] {
        let volumes: Vec<Volume4D> = (0..n)
            .map(|i| volume(square(37.4 + i as f64 * 0.01, -122.1, 0.01)))
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &volumes, |b, volumes| {
            b.iter(|| black_box(union_volumes_4d(volumes, &config).unwrap()))
        });
    }

    group.finish();
}

// ============================================================================
// Protocol Benchmarks
// ============================================================================

fn bench_put_empty_area(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let service = ScdService::new(MemoryStore::new(), ScdConfig::default());
    let manager = Manager::new("bench").unwrap();
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("protocol");
    group.bench_function("put_operational_intent_empty_area", |b| {
        b.to_async(&rt).iter(|| async {
            // Each intent lands in its own cell column so no key is needed.
            let n = counter.fetch_add(1, Ordering::Relaxed);
            let lat = -60.0 + (n % 12_000) as f64 * 0.01;
            let lng = -170.0 + (n / 12_000) as f64 * 0.05;
            let extent = volume(square(lat, lng, 0.005));
            black_box(
                service
                    .put_operational_intent(&manager, &EntityId::new_v4(), &Ovn::empty(), params(&manager, extent, Vec::new()))
                    .await
                    .unwrap(),
            )
        });
    });
    group.finish();
}

fn bench_crowded_area(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let service = ScdService::new(MemoryStore::new(), ScdConfig::default());
    let area = volume(square(37.4, -122.1, 0.02));

    // 50 overlapping intents from distinct managers, each aware of the others.
    let mut key = Vec::new();
    rt.block_on(async {
        for i in 0..50 {
            let manager = Manager::new(format!("uss{i}")).unwrap();
            let oi = service
                .put_operational_intent(&manager, &EntityId::new_v4(), &Ovn::empty(), params(&manager, area.clone(), key.clone()))
                .await
                .unwrap()
                .entity;
            key.push(oi.ovn);
        }
    });

    let newcomer = Manager::new("newcomer").unwrap();
    let mut group = c.benchmark_group("protocol");
    group.throughput(Throughput::Elements(50));

    group.bench_function("query_crowded_area", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(service.query_operational_intents(&newcomer, &area).await.unwrap())
        });
    });

    group.bench_function("reject_incomplete_key", |b| {
        b.to_async(&rt).iter(|| async {
            let err = service
                .put_operational_intent(&newcomer, &EntityId::new_v4(), &Ovn::empty(), params(&newcomer, area.clone(), Vec::new()))
                .await
                .unwrap_err();
            black_box(err)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_covering,
    bench_union,
    bench_put_empty_area,
    bench_crowded_area,
);
criterion_main!(benches);
