// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Links replicating one named property.

use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tandem_proxy::{PropertyObserver, PropertyRef, Proxy, ProxyId, ProxyLocator, ProxyObserver};

use crate::direction::Direction;
use crate::endpoint::LinkEndpoint;
use crate::link::Link;
use crate::link_core::LinkCore;
use crate::state::{LinkState, LinkStateError};

/// Replicates one property from INPUT endpoints to OUTPUT endpoints.
///
/// Endpoints address either a named property of a proxy or a property handle
/// directly. Every insertion re-synchronizes: the first INPUT endpoint's
/// value is copied to every OUTPUT endpoint. Copies are value copies; the
/// properties stay independent.
///
/// ```rust
/// use tandem_link::{Direction, PropertyLink};
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxySpace};
///
/// let space = ProxySpace::new();
/// space.register(
///     ProxyDefinitionBuilder::new("sources", "Sphere")
///         .property("Radius", 0.5)
///         .build(),
/// );
/// let a = space.create("sources", "Sphere").unwrap();
/// let b = space.create("sources", "Sphere").unwrap();
/// a.set("Radius", 2.0).unwrap();
///
/// let link = PropertyLink::new();
/// link.add_endpoint(&a, "Radius", Direction::INPUT);
/// link.add_endpoint(&b, "Radius", Direction::OUTPUT);
/// assert_eq!(b.get("Radius"), Some(PropertyValue::Double(2.0)));
///
/// a.set("Radius", 3.0).unwrap();
/// assert_eq!(b.get("Radius"), Some(PropertyValue::Double(3.0)));
/// ```
pub struct PropertyLink {
    core: LinkCore,
}

impl PropertyLink {
    /// Creates an empty, enabled link.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let observer: Weak<dyn ProxyObserver> = this.clone();
            let property_observer: Weak<dyn PropertyObserver> = this.clone();
            Self {
                core: LinkCore::new(observer).with_property_observer(property_observer),
            }
        })
    }

    /// Links property `name` of `proxy`, then synchronizes.
    ///
    /// Returns `false` if the proxy has no such property, the direction is
    /// empty, or the same endpoint already exists.
    pub fn add_endpoint(&self, proxy: &Proxy, name: &str, direction: Direction) -> bool {
        if proxy.property(name).is_none() {
            tracing::warn!(proxy = %proxy.id(), property = name, "cannot link missing property");
            return false;
        }
        let added = self.core.insert(LinkEndpoint::named(proxy, name, direction));
        self.synchronize();
        added
    }

    /// Links a property handle, then synchronizes.
    pub fn add_property(&self, property: &PropertyRef, direction: Direction) -> bool {
        let endpoint = LinkEndpoint::property(property, direction);
        let added = self.core.insert(endpoint);
        self.synchronize();
        added
    }

    /// Removes the first endpoint addressing `name` on `proxy` by name.
    ///
    /// Removing an absent endpoint is not an error.
    pub fn remove_endpoint(&self, proxy: &Proxy, name: &str) -> bool {
        let id = proxy.id();
        self.core.remove_first(|e| e.is_named(id, name)).is_some()
    }

    /// Removes the first endpoint addressing `property` by handle.
    pub fn remove_property(&self, property: &PropertyRef) -> bool {
        self.core.remove_first(|e| e.is_handle(property)).is_some()
    }

    /// Copies the first INPUT endpoint's value to every OUTPUT endpoint.
    ///
    /// A no-op without an INPUT endpoint or while disabled.
    pub fn synchronize(&self) {
        if !self.core.is_enabled() {
            return;
        }
        let endpoints = self.core.snapshot();
        let Some(source) = endpoints
            .iter()
            .find(|e| e.direction().is_input())
            .and_then(LinkEndpoint::resolve)
        else {
            return;
        };
        let Some(_guard) = self.core.enter() else {
            return;
        };
        copy_to_outputs(&endpoints, &source);
    }

    /// Replaces the endpoints with a persisted block, then synchronizes.
    ///
    /// Every child needs a direction, an id that `locator` resolves, and the
    /// name of a property that proxy has. On error the link is unchanged.
    pub fn load_state(
        &self,
        state: &LinkState,
        locator: &dyn ProxyLocator,
    ) -> Result<(), LinkStateError> {
        self.core.load_state(state, locator, true)?;
        self.synchronize();
        Ok(())
    }
}

fn copy_to_outputs(endpoints: &[LinkEndpoint], source: &PropertyRef) {
    for endpoint in endpoints.iter().filter(|e| e.direction().is_output()) {
        let Some(target) = endpoint.resolve() else {
            continue;
        };
        if PropertyRef::ptr_eq(&target, source) {
            continue;
        }
        target.copy_from(source);
    }
}

impl Link for PropertyLink {
    fn core(&self) -> &LinkCore {
        &self.core
    }

    fn on_property_changed(&self, caller: &Proxy, name: &str) {
        let endpoints = self.core.snapshot();
        let id = caller.id();
        if !endpoints
            .iter()
            .any(|e| e.direction().is_input() && e.is_named(id, name))
        {
            return;
        }
        let Some(source) = caller.property(name) else {
            return;
        };
        tracing::trace!(proxy = %id, property = name, "property link propagating");
        copy_to_outputs(&endpoints, &source);
    }

    fn on_apply_requested(&self, caller: &Proxy) {
        let mut applied: SmallVec<[ProxyId; 4]> = SmallVec::new();
        for endpoint in self.core.snapshot() {
            if !endpoint.direction().is_output() {
                continue;
            }
            let Some(owner) = endpoint.owner() else {
                continue;
            };
            if Proxy::ptr_eq(&owner, caller) || applied.contains(&owner.id()) {
                continue;
            }
            applied.push(owner.id());
            owner.update_resource();
        }
    }

    fn on_property_pushed(&self, caller: &Proxy, name: &str) {
        let endpoints = self.core.snapshot();
        let id = caller.id();
        if !endpoints
            .iter()
            .any(|e| e.direction().is_input() && e.addresses(id, name))
        {
            return;
        }
        for endpoint in endpoints.iter().filter(|e| e.direction().is_output()) {
            if endpoint.addresses(id, name) {
                continue;
            }
            if let (Some(owner), Some(target)) = (endpoint.owner(), endpoint.property_name()) {
                owner.update_property(target);
            }
        }
    }
}

impl ProxyObserver for PropertyLink {
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

impl PropertyObserver for PropertyLink {
    fn property_modified(&self, property: &PropertyRef) {
        if !self.core.is_enabled() {
            return;
        }
        let endpoints = self.core.snapshot();
        if !endpoints
            .iter()
            .any(|e| e.direction().is_input() && e.is_handle(property))
        {
            return;
        }
        let Some(_guard) = self.core.enter() else {
            return;
        };
        copy_to_outputs(&endpoints, property);
    }
}

impl core::fmt::Debug for PropertyLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyLink")
            .field("core", &self.core)
            .finish()
    }
}
