// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tandem Comparative: side-by-side grids of linked views.
//!
//! A [`ComparativeGridManager`] turns one root view into a `dx` by `dy` grid.
//! Every cell gets its own view (or, in overlay mode, its own copies inside
//! the root view) and its own clone of each tracked representation. Links
//! from `tandem_link` keep the clones in step with the originals:
//!
//! - one [`ObjectLink`](tandem_link::ObjectLink) per representation, from the
//!   original to its clones, excluding cache control;
//! - one view link from the root view to every other view, excluding the
//!   per-cell layout, time and camera;
//! - one bidirectional [`CameraLink`](tandem_link::CameraLink) across all
//!   views, so interacting with any cell moves every camera.
//!
//! Per-cell differences come from [`ComparativeCue`]s, which map a cell to a
//! value with a list of [`CueRule`]s. A cue without a target drives the view
//! time; other cues drive one element of one property of a proxy, retargeted
//! to each cell's copy of it.
//!
//! Cell geometry is computed by [`cell_rect`] from [`ComparativeSettings`].
//!
//! ## Example
//!
//! ```rust
//! use tandem_comparative::{ComparativeCue, ComparativeGridManager, CueRule};
//! use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxyFlags, ProxySpace, names};
//!
//! let space = ProxySpace::new();
//! space.register(
//!     ProxyDefinitionBuilder::new("views", "RenderView")
//!         .flags(ProxyFlags::RENDERABLE)
//!         .property(names::REPRESENTATIONS, PropertyValue::Proxies(Vec::new()))
//!         .property(names::VIEW_TIME, 0.0)
//!         .build(),
//! );
//! let root = space.create("views", "RenderView").unwrap();
//!
//! let mut grid = ComparativeGridManager::new(space);
//! grid.initialize(&root);
//! grid.build(3, 1).unwrap();
//!
//! let time = ComparativeCue::new();
//! time.add_rule(CueRule::TRange { min: 0.0, max: 10.0 });
//! grid.add_cue(time);
//!
//! assert!(grid.update().unwrap());
//! assert!(!grid.update().unwrap());
//! assert_eq!(grid.views()[2].get(names::VIEW_TIME), Some(PropertyValue::Double(10.0)));
//! ```
//!
//! ## Threading
//!
//! Like the proxies it manages, a grid is single-threaded.

mod cue;
mod error;
mod event;
mod layout;
mod manager;
mod settings;

pub use cue::{ComparativeCue, CueRule, CueTarget};
pub use error::GridError;
pub use event::GridEvent;
pub use layout::{CellRect, cell_rect};
pub use manager::ComparativeGridManager;
pub use settings::ComparativeSettings;
