// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for building and updating comparative grids.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tandem_comparative::{ComparativeCue, ComparativeGridManager, CueRule};
use tandem_proxy::{PropertyValue, Proxy, ProxyDefinitionBuilder, ProxyFlags, ProxySpace, names};

fn space() -> ProxySpace {
    let space = ProxySpace::new();
    space.register(
        ProxyDefinitionBuilder::new("views", "RenderView")
            .flags(ProxyFlags::RENDERABLE)
            .property(names::REPRESENTATIONS, PropertyValue::Proxies(Vec::new()))
            .property(names::VIEW_SIZE, PropertyValue::ints([0, 0]))
            .property(names::VIEW_POSITION, PropertyValue::ints([0, 0]))
            .property(names::VIEW_TIME, 0.0)
            .build(),
    );
    space.register(
        ProxyDefinitionBuilder::new("representations", "Surface")
            .property(names::VISIBILITY, true)
            .property(names::FORCE_USE_CACHE, false)
            .property(names::CACHE_KEY, 0_i64)
            .property("Opacity", 1.0)
            .build(),
    );
    space
}

fn grid(representations: usize) -> (ProxySpace, Vec<Proxy>, ComparativeGridManager) {
    let space = space();
    let root = space.create("views", "RenderView").expect("registered kind");
    let mut grid = ComparativeGridManager::new(space.clone());
    grid.initialize(&root);
    let reps: Vec<Proxy> = (0..representations)
        .map(|_| space.create("representations", "Surface").expect("registered kind"))
        .collect();
    for r in &reps {
        grid.add_representation(r).expect("initialized grid");
    }
    (space, reps, grid)
}

fn bench_comparative(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparative");

    for side in [2_u32, 4, 8] {
        group.bench_function(BenchmarkId::new("build", side * side), |b| {
            b.iter_batched(
                || grid(4),
                |(_space, _reps, mut grid)| {
                    grid.build(side, side).expect("positive dimensions");
                    black_box(grid)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("update_with_cues", side * side), |b| {
            let (_space, reps, mut grid) = grid(4);
            grid.build(side, side).expect("positive dimensions");
            let time = ComparativeCue::new();
            time.add_rule(CueRule::TRange { min: 0.0, max: 1.0 });
            grid.add_cue(time);
            let opacity = ComparativeCue::new();
            opacity.set_target(&reps[0], "Opacity", 0);
            opacity.add_rule(CueRule::XRange {
                row: None,
                min: 0.0,
                max: 1.0,
            });
            grid.add_cue(opacity);
            let mut t = 0.0;
            b.iter(|| {
                t += 1.0;
                grid.set_view_time(t);
                black_box(grid.update().expect("live cue targets"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_comparative);
criterion_main!(benches);
