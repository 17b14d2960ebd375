// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tandem Link: directed, cycle-safe propagation between proxies.
//!
//! A link connects INPUT endpoints to OUTPUT endpoints and replays changes on
//! the former onto the latter, synchronously and on the stack of the mutation
//! that caused them.
//!
//! - [`PropertyLink`] replicates one named property and synchronizes every
//!   time an endpoint is added.
//! - [`ObjectLink`] replicates every property of whole proxies except the
//!   names in its [`ExceptionFilter`]. It does not synchronize on add.
//! - [`CameraLink`] replicates camera properties only and mirrors camera
//!   gestures as renders of the OUTPUT views.
//!
//! All three implement [`Link`], which carries the shared flags and endpoint
//! list in a [`LinkCore`]. Each link holds a per-instance reentrancy flag:
//! while it is propagating, notifications that loop back into the *same*
//! link are dropped. Two links wired `A -> B` and `B -> A` therefore settle
//! after one round.
//!
//! ## Example
//!
//! ```rust
//! use tandem_link::{Direction, Link, ObjectLink};
//! use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxySpace};
//!
//! let space = ProxySpace::new();
//! space.register(
//!     ProxyDefinitionBuilder::new("sources", "Sphere")
//!         .property("Radius", 0.5)
//!         .build(),
//! );
//! let a = space.create("sources", "Sphere").unwrap();
//! let b = space.create("sources", "Sphere").unwrap();
//!
//! let forward = ObjectLink::new();
//! forward.add_endpoint(&a, Direction::INPUT);
//! forward.add_endpoint(&b, Direction::OUTPUT);
//! let backward = ObjectLink::new();
//! backward.add_endpoint(&b, Direction::INPUT);
//! backward.add_endpoint(&a, Direction::OUTPUT);
//!
//! a.set("Radius", 2.0).unwrap();
//! assert_eq!(b.get("Radius"), Some(PropertyValue::Double(2.0)));
//!
//! // Persist the endpoints; exception filters are not included.
//! let state = forward.save_state();
//! assert_eq!(state.endpoints.len(), 2);
//! ```
//!
//! ## Ownership
//!
//! Links are created as `Rc`s and observe their endpoint proxies weakly; a
//! link never keeps a proxy alive. Dropping a link unregisters it, and a
//! destroyed proxy's endpoints are removed from every link observing it.

mod camera_link;
mod direction;
mod endpoint;
mod filter;
mod link;
mod link_core;
mod object_link;
mod property_link;
mod state;

pub use camera_link::CameraLink;
pub use direction::Direction;
pub use endpoint::{EndpointTarget, LinkEndpoint};
pub use filter::ExceptionFilter;
pub use link::Link;
pub use link_core::{LinkCore, PropagationGuard};
pub use object_link::ObjectLink;
pub use property_link::PropertyLink;
pub use state::{EndpointState, LinkState, LinkStateError};
