// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tandem Proxy: a headless object space of proxies with named properties.
//!
//! This crate models the stateful objects that Tandem links keep in sync:
//!
//! - **Proxies** ([`Proxy`]): shared handles to objects of a registered kind,
//!   each with an ordered set of named properties.
//! - **Properties** ([`PropertyRef`]): independently copyable slots holding a
//!   [`PropertyValue`], with identity and a "modified since push" flag.
//! - **Definitions** ([`ProxyDefinition`], [`DefinitionRegistry`]): proxy
//!   kinds keyed by `(group, name)`, used by [`ProxySpace::create`] as a
//!   factory and by [`ProxySpace::create_like`] for cloning.
//! - **Observers** ([`ProxyObserver`], [`PropertyObserver`]): synchronous,
//!   weakly held callbacks for value changes, pushes, camera gestures and
//!   destruction.
//! - **Producer/consumer edges** ([`ProducerConsumerGraph`]): maintained by the
//!   space whenever a [`PropertyValue::Proxies`] value changes.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tandem_proxy::{Proxy, ProxyDefinitionBuilder, ProxyObserver, ProxySpace};
//!
//! struct Changes(Cell<u32>);
//!
//! impl ProxyObserver for Changes {
//!     fn property_changed(&self, _proxy: &Proxy, _name: &str) {
//!         self.0.set(self.0.get() + 1);
//!     }
//! }
//!
//! let space = ProxySpace::new();
//! space.register(
//!     ProxyDefinitionBuilder::new("sources", "Sphere")
//!         .property("Radius", 0.5)
//!         .build(),
//! );
//!
//! let sphere = space.create("sources", "Sphere").unwrap();
//! let changes = Rc::new(Changes(Cell::new(0)));
//! sphere.add_observer(Rc::downgrade(&changes) as _);
//!
//! sphere.set("Radius", 1.0).unwrap();
//! sphere.set("Radius", 1.0).unwrap(); // equal value: no notification
//! assert_eq!(changes.0.get(), 1);
//! ```
//!
//! ## Resource side
//!
//! Property assignment only changes the local value. [`Proxy::update_property`]
//! and [`Proxy::update_resource`] push modified values to the resource side,
//! which is what [`Proxy::mark_dirty`] consults for cache forcing
//! ([`names::FORCE_USE_CACHE`]).
//!
//! ## Threading
//!
//! Everything is single-threaded (`Rc`/`RefCell`). An embedding that needs
//! concurrency must serialize all access to a space.

mod definition;
mod error;
mod graph;
mod id;
pub mod names;
mod property;
mod proxy;
mod registry;
mod space;
mod value;

pub use definition::{PropertyDefinition, ProxyDefinition, ProxyDefinitionBuilder, ProxyFlags};
pub use error::ProxyError;
pub use graph::{Dependency, ProducerConsumerGraph};
pub use id::ProxyId;
pub use property::{PropertyObserver, PropertyRef};
pub use proxy::{Interaction, PipelineState, Proxy, ProxyObserver, WeakProxy};
pub use registry::DefinitionRegistry;
pub use space::{ProxyLocator, ProxySpace};
pub use value::{Components, PropertyValue};
