// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for producer/consumer bookkeeping in `tandem_proxy`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tandem_proxy::{PropertyValue, Proxy, ProxyDefinitionBuilder, ProxyId, ProxySpace, names};

fn space() -> ProxySpace {
    let space = ProxySpace::new();
    space.register(
        ProxyDefinitionBuilder::new("filters", "Append")
            .property(names::INPUT, PropertyValue::Proxies(Vec::new()))
            .build(),
    );
    space
}

fn chain(space: &ProxySpace, n: usize) -> Vec<Proxy> {
    let nodes: Vec<Proxy> = (0..n)
        .map(|_| space.create("filters", "Append").expect("registered kind"))
        .collect();
    for pair in nodes.windows(2) {
        pair[1]
            .set(names::INPUT, vec![pair[0].id()])
            .expect("known property");
    }
    nodes
}

fn bench_dependencies(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependencies");

    for n in [16_usize, 256] {
        group.bench_function(BenchmarkId::new("retarget_input", n), |b| {
            let space = space();
            let nodes = chain(&space, n);
            let sink = &nodes[n - 1];
            let sources: Vec<ProxyId> = nodes[..n - 1].iter().map(Proxy::id).collect();
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % sources.len();
                black_box(sink.set(names::INPUT, vec![sources[i]]))
            });
        });

        group.bench_function(BenchmarkId::new("rebuild", n), |b| {
            let space = space();
            let _nodes = chain(&space, n);
            b.iter(|| black_box(space.rebuild_dependencies()));
        });

        group.bench_function(BenchmarkId::new("teardown", n), |b| {
            b.iter_batched(
                || {
                    let space = space();
                    let nodes = chain(&space, n);
                    (space, nodes)
                },
                |(space, nodes)| {
                    drop(nodes);
                    black_box(space.graph().is_empty())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dependencies);
criterion_main!(benches);
