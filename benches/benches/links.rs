// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for propagation through `tandem_link`.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tandem_link::{CameraLink, Direction, Link, ObjectLink, PropertyLink};
use tandem_proxy::{
    Interaction, PropertyValue, Proxy, ProxyDefinitionBuilder, ProxyFlags, ProxySpace, names,
};

fn space() -> ProxySpace {
    let space = ProxySpace::new();
    let mut surface = ProxyDefinitionBuilder::new("representations", "Surface")
        .property(names::FORCE_USE_CACHE, false)
        .property(names::CACHE_KEY, 0_i64);
    // A realistically wide representation.
    for i in 0..32 {
        surface = surface.property(format!("Parameter{i}"), 0.0);
    }
    space.register(surface.build());

    let mut view = ProxyDefinitionBuilder::new("views", "RenderView")
        .flags(ProxyFlags::RENDERABLE);
    for name in names::CAMERA_PROPERTIES {
        view = view.property(name, PropertyValue::doubles([0.0, 0.0, 0.0]));
    }
    space.register(view.build());
    space
}

fn create(space: &ProxySpace, group: &str, kind: &str, n: usize) -> Vec<Proxy> {
    (0..n)
        .map(|_| space.create(group, kind).expect("registered kind"))
        .collect()
}

fn bench_links(c: &mut Criterion) {
    let space = space();
    let mut group = c.benchmark_group("link/fan_out");

    for outputs in [1_usize, 8, 64] {
        let proxies = create(&space, "representations", "Surface", outputs + 1);

        let link = PropertyLink::new();
        link.add_endpoint(&proxies[0], "Parameter0", Direction::INPUT);
        for p in &proxies[1..] {
            link.add_endpoint(p, "Parameter0", Direction::OUTPUT);
        }
        let mut value = 0.0;
        group.bench_function(BenchmarkId::new("property_link", outputs), |b| {
            b.iter(|| {
                value += 1.0;
                black_box(proxies[0].set("Parameter0", value))
            });
        });
        drop(link);

        let link = ObjectLink::new();
        link.add_endpoint(&proxies[0], Direction::INPUT);
        for p in &proxies[1..] {
            link.add_endpoint(p, Direction::OUTPUT);
        }
        group.bench_function(BenchmarkId::new("object_link", outputs), |b| {
            b.iter(|| {
                value += 1.0;
                black_box(proxies[0].set("Parameter7", value))
            });
        });
        group.bench_function(BenchmarkId::new("object_link_excepted", outputs), |b| {
            b.iter(|| {
                value += 1.0;
                black_box(proxies[0].set(names::CACHE_KEY, value as i64))
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("link/cycles");
    let pair = create(&space, "representations", "Surface", 2);
    let forward = ObjectLink::new();
    forward.add_endpoint(&pair[0], Direction::INPUT);
    forward.add_endpoint(&pair[1], Direction::OUTPUT);
    let backward = ObjectLink::new();
    backward.add_endpoint(&pair[1], Direction::INPUT);
    backward.add_endpoint(&pair[0], Direction::OUTPUT);
    let mut value = 0.0;
    group.bench_function("opposing_object_links", |b| {
        b.iter(|| {
            value += 1.0;
            black_box(pair[0].set("Parameter0", value))
        });
    });
    group.finish();

    let mut group = c.benchmark_group("link/camera");
    for views in [4_usize, 16] {
        let views = create(&space, "views", "RenderView", views);
        let link = CameraLink::new();
        for v in &views {
            link.add_endpoint(v, Direction::INPUT | Direction::OUTPUT);
        }
        group.bench_function(BenchmarkId::new("gesture_render", views.len()), |b| {
            b.iter(|| views[0].interact(Interaction::Render { interactive: true }));
        });
        group.bench_function(BenchmarkId::new("save_state_json", views.len()), |b| {
            b.iter(|| black_box(serde_json::to_string(&link.save_state()).expect("serializable")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_links);
criterion_main!(benches);
