// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Links replicating whole proxies.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tandem_proxy::{Proxy, ProxyId, ProxyLocator, ProxyObserver};

use crate::direction::Direction;
use crate::endpoint::LinkEndpoint;
use crate::filter::ExceptionFilter;
use crate::link::Link;
use crate::link_core::LinkCore;
use crate::state::{LinkState, LinkStateError};

/// Replicates every property of INPUT proxies onto OUTPUT proxies.
///
/// A change to property `p` on an INPUT proxy is copied to the same-named
/// property of every other OUTPUT proxy, unless `p` is in the exception
/// filter. Unlike [`PropertyLink`](crate::PropertyLink), adding an endpoint
/// does not synchronize: a new OUTPUT proxy keeps its values until the next
/// change on an INPUT proxy.
///
/// ```rust
/// use tandem_link::{Direction, ObjectLink};
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxySpace};
///
/// let space = ProxySpace::new();
/// space.register(
///     ProxyDefinitionBuilder::new("representations", "Surface")
///         .property("Opacity", 1.0)
///         .property("CacheKey", 0_i64)
///         .build(),
/// );
/// let a = space.create("representations", "Surface").unwrap();
/// let b = space.create("representations", "Surface").unwrap();
///
/// let link = ObjectLink::new();
/// link.add_endpoint(&a, Direction::INPUT);
/// link.add_endpoint(&b, Direction::OUTPUT);
/// link.add_exception("CacheKey");
///
/// a.set("Opacity", 0.5).unwrap();
/// a.set("CacheKey", 7_i64).unwrap();
/// assert_eq!(b.get("Opacity"), Some(PropertyValue::Double(0.5)));
/// assert_eq!(b.get("CacheKey"), Some(PropertyValue::Int(0)));
/// ```
pub struct ObjectLink {
    core: LinkCore,
    exceptions: RefCell<ExceptionFilter>,
}

impl ObjectLink {
    /// Creates an empty, enabled link.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let observer: Weak<dyn ProxyObserver> = this.clone();
            Self {
                core: LinkCore::new(observer),
                exceptions: RefCell::new(ExceptionFilter::new()),
            }
        })
    }

    /// Links `proxy` in role `direction`.
    ///
    /// Returns `false` for an empty direction or an existing `(proxy, direction)`.
    pub fn add_endpoint(&self, proxy: &Proxy, direction: Direction) -> bool {
        self.core.insert(LinkEndpoint::proxy(proxy, direction))
    }

    /// Removes the first endpoint for `proxy`. Absent proxies are ignored.
    pub fn remove_endpoint(&self, proxy: &Proxy) -> bool {
        let id = proxy.id();
        self.core.remove_first(|e| e.is_proxy(id)).is_some()
    }

    /// Stops `name` from propagating.
    pub fn add_exception(&self, name: &str) {
        self.exceptions.borrow_mut().insert(name);
    }

    /// Lets `name` propagate again.
    pub fn remove_exception(&self, name: &str) {
        self.exceptions.borrow_mut().remove(name);
    }

    /// Returns `true` if `name` does not propagate.
    #[must_use]
    pub fn is_excepted(&self, name: &str) -> bool {
        self.exceptions.borrow().contains(name)
    }

    /// Returns a copy of the exception filter.
    #[must_use]
    pub fn exceptions(&self) -> ExceptionFilter {
        self.exceptions.borrow().clone()
    }

    /// Replaces the endpoints with a persisted block.
    ///
    /// The exception filter is not part of the block and is kept as is.
    pub fn load_state(
        &self,
        state: &LinkState,
        locator: &dyn ProxyLocator,
    ) -> Result<(), LinkStateError> {
        self.core.load_state(state, locator, false)
    }
}

/// Returns the live OUTPUT proxies of `core` other than `caller`, each once.
pub(crate) fn output_proxies(core: &LinkCore, caller: &Proxy) -> SmallVec<[Proxy; 4]> {
    let mut outputs: SmallVec<[Proxy; 4]> = SmallVec::new();
    for endpoint in core.snapshot() {
        if !endpoint.direction().is_output() || endpoint.property_name().is_some() {
            continue;
        }
        let Some(proxy) = endpoint.owner() else {
            continue;
        };
        if Proxy::ptr_eq(&proxy, caller) || outputs.iter().any(|p| Proxy::ptr_eq(p, &proxy)) {
            continue;
        }
        outputs.push(proxy);
    }
    outputs
}

/// Copies `caller.name` onto every other OUTPUT proxy that has it.
pub(crate) fn copy_property(core: &LinkCore, caller: &Proxy, name: &str) {
    let Some(source) = caller.property(name) else {
        return;
    };
    for target in output_proxies(core, caller) {
        if let Some(property) = target.property(name) {
            property.copy_from(&source);
        }
    }
}

pub(crate) fn push_property(core: &LinkCore, caller: &Proxy, name: &str) {
    for target in output_proxies(core, caller) {
        target.update_property(name);
    }
}

pub(crate) fn apply(core: &LinkCore, caller: &Proxy) {
    for target in output_proxies(core, caller) {
        target.update_resource();
    }
}

impl Link for ObjectLink {
    fn core(&self) -> &LinkCore {
        &self.core
    }

    fn on_property_changed(&self, caller: &Proxy, name: &str) {
        if self.is_excepted(name) {
            return;
        }
        tracing::trace!(proxy = %caller.id(), property = name, "object link propagating");
        copy_property(&self.core, caller, name);
    }

    fn on_apply_requested(&self, caller: &Proxy) {
        apply(&self.core, caller);
    }

    fn on_property_pushed(&self, caller: &Proxy, name: &str) {
        if self.is_excepted(name) {
            return;
        }
        push_property(&self.core, caller, name);
    }
}

impl ProxyObserver for ObjectLink {
    fn property_changed(&self, proxy: &Proxy, name: &str) {
        self.dispatch_property_changed(proxy, name);
    }

    fn resource_updated(&self, proxy: &Proxy) {
        self.dispatch_apply_requested(proxy);
    }

    fn property_pushed(&self, proxy: &Proxy, name: &str) {
        self.dispatch_property_pushed(proxy, name);
    }

    fn proxy_destroyed(&self, id: ProxyId) {
        self.core.forget_proxy(id);
    }
}

impl core::fmt::Debug for ObjectLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectLink")
            .field("core", &self.core)
            .field("exceptions", &*self.exceptions.borrow())
            .finish()
    }
}
