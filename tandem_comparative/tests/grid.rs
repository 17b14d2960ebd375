// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building, updating and tearing down comparative grids.

use std::cell::RefCell;
use std::rc::Rc;

use tandem_comparative::{
    ComparativeCue, ComparativeGridManager, ComparativeSettings, CueRule, GridError, GridEvent,
};
use tandem_proxy::{
    Interaction, PropertyValue, Proxy, ProxyDefinitionBuilder, ProxyFlags, ProxyId, ProxySpace,
    names,
};

fn space() -> ProxySpace {
    let space = ProxySpace::new();
    let mut view = ProxyDefinitionBuilder::new("views", "RenderView")
        .flags(ProxyFlags::RENDERABLE)
        .property(names::REPRESENTATIONS, PropertyValue::Proxies(Vec::new()))
        .property(names::VIEW_SIZE, PropertyValue::ints([0, 0]))
        .property(names::VIEW_POSITION, PropertyValue::ints([0, 0]))
        .property(names::VIEW_TIME, 0.0)
        .property("Background", PropertyValue::doubles([0.0, 0.0, 0.0]));
    for name in names::CAMERA_PROPERTIES {
        view = view.property(name, PropertyValue::doubles([0.0, 0.0, 0.0]));
    }
    space.register(view.build());
    space.register(
        ProxyDefinitionBuilder::new("representations", "Surface")
            .property(names::VISIBILITY, true)
            .property(names::FORCE_USE_CACHE, false)
            .property(names::CACHE_KEY, 0_i64)
            .property("Opacity", 1.0)
            .property("Color", PropertyValue::doubles([1.0, 1.0, 1.0]))
            .build(),
    );
    space
}

struct Fixture {
    space: ProxySpace,
    root: Proxy,
    surface: Proxy,
    grid: ComparativeGridManager,
}

fn fixture(settings: ComparativeSettings) -> Fixture {
    let space = space();
    let root = space.create("views", "RenderView").unwrap();
    let surface = space.create("representations", "Surface").unwrap();
    let mut grid = ComparativeGridManager::with_settings(space.clone(), settings);
    grid.initialize(&root);
    grid.add_representation(&surface).unwrap();
    Fixture {
        space,
        root,
        surface,
        grid,
    }
}

fn listed(view: &Proxy) -> Vec<ProxyId> {
    view.get(names::REPRESENTATIONS)
        .map(|v| v.proxies().to_vec())
        .unwrap_or_default()
}

fn time_of(view: &Proxy) -> Option<f64> {
    view.get(names::VIEW_TIME).and_then(|v| v.as_f64())
}

#[test]
fn each_cell_gets_a_view_and_a_clone() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 2).unwrap();

    let views = f.grid.views().to_vec();
    assert_eq!(views.len(), 4);
    assert!(Proxy::ptr_eq(&views[0], &f.root));
    assert_eq!(listed(&f.root), vec![f.surface.id()]);

    let clones = f.grid.clones_of(&f.surface);
    assert_eq!(clones.len(), 3);
    for (view, clone) in views[1..].iter().zip(&clones) {
        assert_eq!(listed(view), vec![clone.id()]);
        assert_eq!(clone.kind(), "Surface");
    }
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(
                f.grid.representations_at(x, y).len(),
                1,
                "cell ({x}, {y}) shows one copy"
            );
        }
    }
}

#[test]
fn overlay_puts_every_copy_in_the_root_view() {
    let mut f = fixture(ComparativeSettings::default().with_overlay(true));
    f.grid.build(3, 1).unwrap();

    assert_eq!(f.grid.views().len(), 1);
    let clones = f.grid.clones_of(&f.surface);
    assert_eq!(clones.len(), 2);

    let mut expected = vec![f.surface.id()];
    expected.extend(clones.iter().map(Proxy::id));
    assert_eq!(listed(&f.root), expected);

    let cell = f.grid.copy_in_cell(&f.surface, 2, 0).unwrap().unwrap();
    assert!(Proxy::ptr_eq(&cell, &clones[1]));
    assert_eq!(f.grid.copy_in_cell(&f.surface, 3, 0), Ok(None));
}

#[test]
fn toggling_overlay_rebuilds() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 2).unwrap();

    f.grid.set_overlay(true).unwrap();
    assert_eq!(f.grid.views().len(), 1);
    assert_eq!(f.grid.clones_of(&f.surface).len(), 3);
    assert_eq!(listed(&f.root).len(), 4);

    f.grid.set_overlay(false).unwrap();
    assert_eq!(f.grid.views().len(), 4);
    assert_eq!(f.grid.clones_of(&f.surface).len(), 3);
    assert_eq!(listed(&f.root), vec![f.surface.id()]);
}

#[test]
fn shrinking_destroys_views_and_clones() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    let second = f.grid.views()[1].id();
    let clone = f.grid.clones_of(&f.surface)[0].id();

    f.grid.build(1, 1).unwrap();

    assert_eq!(f.grid.views().len(), 1);
    assert!(f.grid.clones_of(&f.surface).is_empty());
    assert!(f.space.locate(second).is_none());
    assert!(f.space.locate(clone).is_none());
    assert_eq!(listed(&f.root), vec![f.surface.id()]);
    assert_eq!(f.space.len(), 2);
}

#[test]
fn growing_again_reuses_nothing_stale() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(3, 1).unwrap();
    f.grid.build(2, 1).unwrap();
    f.grid.build(3, 2).unwrap();

    assert_eq!(f.grid.views().len(), 6);
    assert_eq!(f.grid.clones_of(&f.surface).len(), 5);
    assert_eq!(f.space.len(), 6 + 6);
}

#[test]
fn removing_a_representation_destroys_its_clones() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 2).unwrap();
    assert_eq!(f.space.len(), 4 + 4);

    f.grid.remove_representation(&f.surface);

    assert!(!f.grid.is_tracked(&f.surface));
    assert!(f.grid.representations().is_empty());
    assert_eq!(f.space.len(), 4 + 1);
    for view in f.grid.views() {
        assert!(listed(view).is_empty(), "view {} still lists copies", view.id());
    }

    f.grid.remove_representation(&f.surface);
    assert_eq!(f.space.len(), 4 + 1);
}

#[test]
fn remove_all_representations_empties_the_grid() {
    let mut f = fixture(ComparativeSettings::default());
    let other = f.space.create("representations", "Surface").unwrap();
    f.grid.add_representation(&other).unwrap();
    f.grid.build(2, 1).unwrap();
    assert_eq!(f.grid.representations_at(1, 0).len(), 2);

    f.grid.remove_all_representations();

    assert!(f.grid.representations().is_empty());
    assert!(f.grid.representations_at(1, 0).is_empty());
    assert!(listed(&f.root).is_empty());
}

#[test]
fn adding_twice_is_a_no_op() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    f.grid.add_representation(&f.surface).unwrap();

    assert_eq!(f.grid.representations().len(), 1);
    assert_eq!(f.grid.clones_of(&f.surface).len(), 1);
    assert_eq!(listed(&f.root), vec![f.surface.id()]);
}

#[test]
fn representation_edits_reach_clones_except_cache_control() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(3, 1).unwrap();

    f.surface.set("Opacity", 0.5).unwrap();
    f.surface.set(names::CACHE_KEY, 7_i64).unwrap();

    for clone in f.grid.clones_of(&f.surface) {
        assert_eq!(clone.get("Opacity"), Some(PropertyValue::Double(0.5)));
        assert_eq!(clone.get(names::CACHE_KEY), Some(PropertyValue::Int(0)));
    }
}

#[test]
fn root_view_edits_reach_other_views_except_per_cell_state() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    let second = f.grid.views()[1].clone();

    f.root.set("Background", PropertyValue::doubles([0.2, 0.2, 0.2])).unwrap();
    f.root.set(names::VIEW_TIME, 5.0).unwrap();

    assert_eq!(
        second.get("Background"),
        Some(PropertyValue::doubles([0.2, 0.2, 0.2]))
    );
    assert_eq!(time_of(&second), Some(0.0));
    assert_eq!(listed(&second).len(), 1);
}

#[test]
fn cameras_follow_any_cell() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(3, 1).unwrap();
    let views = f.grid.views().to_vec();
    let eye = PropertyValue::doubles([0.0, 0.0, 10.0]);

    views[2].set(names::CAMERA_POSITION, eye.clone()).unwrap();
    for view in &views {
        assert_eq!(view.get(names::CAMERA_POSITION), Some(eye.clone()));
    }

    views[1].interact(Interaction::Render { interactive: false });
    assert_eq!(views[0].pipeline().still_renders, 1);
    assert_eq!(views[1].pipeline().still_renders, 1);
    assert_eq!(views[2].pipeline().still_renders, 1);
}

#[test]
fn zero_dimensions_are_rejected() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();

    assert_eq!(
        f.grid.build(0, 3),
        Err(GridError::InvalidDimensions { dx: 0, dy: 3 })
    );
    assert_eq!(f.grid.views().len(), 2);
    assert_eq!(f.grid.dimensions(), (2, 1));
}

#[test]
fn uninitialized_grid_refuses_work() {
    let space = space();
    let surface = space.create("representations", "Surface").unwrap();
    let mut grid = ComparativeGridManager::new(space);

    assert_eq!(grid.build(2, 2), Err(GridError::NotInitialized));
    assert_eq!(
        grid.add_representation(&surface),
        Err(GridError::NotInitialized)
    );
    assert!(grid.root_view().is_none());
}

#[test]
fn initialize_is_one_shot() {
    let mut f = fixture(ComparativeSettings::default());
    let other = f.space.create("views", "RenderView").unwrap();
    f.grid.initialize(&other);
    assert!(Proxy::ptr_eq(f.grid.root_view().unwrap(), &f.root));
}

#[test]
fn untracked_queries() {
    let f = fixture(ComparativeSettings::default());
    let stranger = f.space.create("representations", "Surface").unwrap();

    assert!(f.grid.clones_of(&stranger).is_empty());
    assert_eq!(
        f.grid.copy_in_cell(&stranger, 0, 0),
        Err(GridError::UntrackedRepresentation {
            representation: stranger.id()
        })
    );
    assert!(f.grid.representations_at(5, 5).is_empty());
}

#[test]
fn update_runs_once_per_change() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 2).unwrap();

    assert!(f.grid.is_outdated());
    assert!(f.grid.update().unwrap());
    assert!(!f.grid.is_outdated());
    assert!(!f.grid.update().unwrap());

    for view in f.grid.views() {
        assert_eq!(view.pipeline().still_renders, 1);
    }
    assert_eq!(f.surface.pipeline().update_count, 1);
    for clone in f.grid.clones_of(&f.surface) {
        assert_eq!(clone.pipeline().update_count, 1);
    }

    f.grid.set_view_time(3.0);
    assert!(f.grid.update().unwrap());
    assert_eq!(time_of(&f.root), Some(3.0));
}

#[test]
fn time_cue_spreads_over_the_cells() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 2).unwrap();
    let cue = ComparativeCue::new();
    cue.add_rule(CueRule::TRange { min: 0.0, max: 3.0 });
    f.grid.add_cue(cue.clone());

    f.grid.update().unwrap();

    let times: Vec<_> = f.grid.views().iter().map(time_of).collect();
    assert_eq!(times, vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
    let clones = f.grid.clones_of(&f.surface);
    assert_eq!(f.surface.pipeline().last_update_time, Some(0.0));
    assert_eq!(clones[2].pipeline().last_update_time, Some(3.0));

    cue.clear_rules();
    cue.add_rule(CueRule::TRangeVerticalFirst { min: 0.0, max: 3.0 });
    assert!(f.grid.is_outdated());
    f.grid.update().unwrap();
    let times: Vec<_> = f.grid.views().iter().map(time_of).collect();
    assert_eq!(times, vec![Some(0.0), Some(2.0), Some(1.0), Some(3.0)]);
}

#[test]
fn disabled_cues_are_skipped() {
    let mut f = fixture(ComparativeSettings::default().with_view_time(4.0));
    f.grid.build(2, 1).unwrap();
    let cue = ComparativeCue::new();
    cue.add_rule(CueRule::Single {
        x: None,
        y: None,
        value: 9.0,
    });
    cue.set_enabled(false);
    f.grid.add_cue(cue);

    f.grid.update().unwrap();
    for view in f.grid.views() {
        assert_eq!(time_of(view), Some(4.0));
    }
}

#[test]
fn property_cue_lands_on_each_cells_copy() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(3, 1).unwrap();
    let cue = ComparativeCue::new();
    cue.set_target(&f.surface, "Color", 1);
    cue.add_rule(CueRule::XRange {
        row: None,
        min: 0.0,
        max: 1.0,
    });
    f.grid.add_cue(cue);

    f.grid.update().unwrap();

    let color = |p: &Proxy| p.get("Color").and_then(|v| v.element(1));
    let clones = f.grid.clones_of(&f.surface);
    assert_eq!(color(&f.surface), Some(0.0));
    assert_eq!(color(&clones[0]), Some(0.5));
    assert_eq!(color(&clones[1]), Some(1.0));

    // Replication is back on after the update.
    f.surface.set("Opacity", 0.1).unwrap();
    assert_eq!(clones[1].get("Opacity"), Some(PropertyValue::Double(0.1)));
    assert_eq!(color(&clones[1]), Some(1.0));
}

#[test]
fn camera_cue_keeps_per_cell_values() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    let cue = ComparativeCue::new();
    cue.set_target(&f.root, names::CAMERA_VIEW_ANGLE, 0);
    cue.add_rule(CueRule::XRange {
        row: None,
        min: 10.0,
        max: 20.0,
    });
    f.grid.add_cue(cue);

    f.grid.update().unwrap();

    let angle = |v: &Proxy| v.get(names::CAMERA_VIEW_ANGLE)?.element(0);
    let angles: Vec<_> = f.grid.views().iter().map(angle).collect();
    assert_eq!(angles, vec![Some(10.0), Some(20.0)]);

    // Camera mirroring resumes once the update is done.
    let eye = PropertyValue::doubles([1.0, 2.0, 3.0]);
    f.grid.views()[1].set(names::CAMERA_POSITION, eye.clone()).unwrap();
    assert_eq!(f.root.get(names::CAMERA_POSITION), Some(eye));
}

#[test]
fn lost_cue_target_fails_the_update() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    let extra = f.space.create("representations", "Surface").unwrap();
    let cue = ComparativeCue::new();
    cue.set_target(&extra, "Opacity", 0);
    cue.add_rule(CueRule::TRange { min: 0.0, max: 1.0 });
    f.grid.add_cue(cue.clone());
    drop(extra);

    assert_eq!(f.grid.update(), Err(GridError::CueTargetLost { cue: 0 }));
    assert!(f.grid.is_outdated());

    assert!(f.grid.remove_cue(&cue));
    assert!(f.grid.update().unwrap());
}

#[test]
fn caches_are_cleared_before_each_update() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    f.surface.set(names::FORCE_USE_CACHE, true).unwrap();
    f.surface.update_property(names::FORCE_USE_CACHE);

    f.surface.mark_dirty();
    assert_eq!(f.surface.pipeline().data_generation, 0);

    f.grid.update().unwrap();

    assert_eq!(f.surface.pipeline().data_generation, 1);
    assert_eq!(
        f.surface.property(names::FORCE_USE_CACHE).unwrap().pushed_value(),
        Some(PropertyValue::Bool(true))
    );
    let clone = &f.grid.clones_of(&f.surface)[0];
    assert_eq!(clone.pipeline().data_generation, 1);
}

#[test]
fn hidden_representations_are_not_updated() {
    let mut f = fixture(ComparativeSettings::default());
    f.grid.build(2, 1).unwrap();
    f.surface.set(names::VISIBILITY, false).unwrap();

    f.grid.update().unwrap();

    assert_eq!(f.surface.pipeline().update_count, 0);
    assert_eq!(f.grid.clones_of(&f.surface)[0].pipeline().update_count, 0);
    assert_eq!(f.root.pipeline().still_renders, 1);
}

#[test]
fn overlay_update_renders_the_root_once() {
    let mut f = fixture(ComparativeSettings::default().with_overlay(true));
    f.grid.build(2, 2).unwrap();
    let cue = ComparativeCue::new();
    cue.add_rule(CueRule::TRange { min: 0.0, max: 3.0 });
    f.grid.add_cue(cue);

    f.grid.update().unwrap();

    assert_eq!(f.root.pipeline().still_renders, 1);
    let clones = f.grid.clones_of(&f.surface);
    assert_eq!(clones[0].pipeline().last_update_time, Some(1.0));
    assert_eq!(clones[2].pipeline().last_update_time, Some(3.0));
}

#[test]
fn layout_splits_the_view_size() {
    let settings = ComparativeSettings::default()
        .with_view_size(400, 200)
        .with_view_position(10, 20)
        .with_spacing(0, 0);
    let mut f = fixture(settings);
    f.grid.build(2, 1).unwrap();

    let second = &f.grid.views()[1];
    assert_eq!(second.get(names::VIEW_SIZE), Some(PropertyValue::ints([200, 200])));
    assert_eq!(
        second.get(names::VIEW_POSITION),
        Some(PropertyValue::ints([210, 20]))
    );

    f.grid.set_view_size(800, 200);
    assert_eq!(
        f.grid.views()[1].get(names::VIEW_SIZE),
        Some(PropertyValue::ints([400, 200]))
    );
}

#[test]
fn listeners_hear_layout_and_membership_changes() {
    let mut f = fixture(ComparativeSettings::default());
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    f.grid.subscribe(move |event| sink.borrow_mut().push(*event));

    f.grid.build(2, 1).unwrap();
    f.grid.remove_representation(&f.surface);
    f.grid.remove_representation(&f.surface);
    f.grid.add_representation(&f.surface).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            GridEvent::LayoutChanged,
            GridEvent::RepresentationSetChanged,
            GridEvent::RepresentationSetChanged,
        ]
    );
}

#[test]
fn dropping_the_grid_tears_it_down() {
    let Fixture {
        space,
        root,
        surface,
        mut grid,
    } = fixture(ComparativeSettings::default());
    grid.build(3, 1).unwrap();
    assert_eq!(space.len(), 3 + 3);

    drop(grid);

    assert_eq!(space.len(), 2);
    assert_eq!(listed(&root), vec![surface.id()]);
    surface.set("Opacity", 0.3).unwrap();
}
