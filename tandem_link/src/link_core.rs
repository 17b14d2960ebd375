// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Endpoint bookkeeping shared by every link kind.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Weak;

use tandem_proxy::{PropertyObserver, ProxyId, ProxyLocator, ProxyObserver};

use crate::direction::Direction;
use crate::endpoint::{EndpointTarget, LinkEndpoint};
use crate::state::{EndpointState, LinkState, LinkStateError};

/// Marks a link as propagating until dropped.
///
/// Obtained from [`LinkCore::enter`]. The flag is reset on every exit path,
/// including unwinding.
#[derive(Debug)]
pub struct PropagationGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for PropagationGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// State shared by every link: endpoints, flags, and the reentrancy guard.
///
/// The core registers its link as an observer on every endpoint proxy (and,
/// when a property observer is supplied, on INPUT property handles) and
/// removes those registrations again when endpoints go away or the core is
/// dropped.
pub struct LinkCore {
    endpoints: RefCell<Vec<LinkEndpoint>>,
    enabled: Cell<bool>,
    propagate_apply: Cell<bool>,
    propagating: Cell<bool>,
    observer: Weak<dyn ProxyObserver>,
    property_observer: Option<Weak<dyn PropertyObserver>>,
}

impl LinkCore {
    /// Creates a core that registers `observer` on endpoint proxies.
    #[must_use]
    pub fn new(observer: Weak<dyn ProxyObserver>) -> Self {
        Self {
            endpoints: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            propagate_apply: Cell::new(true),
            propagating: Cell::new(false),
            observer,
            property_observer: None,
        }
    }

    /// Also registers `observer` on INPUT property-handle endpoints.
    #[must_use]
    pub fn with_property_observer(mut self, observer: Weak<dyn PropertyObserver>) -> Self {
        self.property_observer = Some(observer);
        self
    }

    /// Returns `true` unless propagation was disabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enables or disables propagation. Endpoints are unaffected.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Returns `true` if apply requests are forwarded.
    #[must_use]
    #[inline]
    pub fn propagate_apply(&self) -> bool {
        self.propagate_apply.get()
    }

    /// Controls whether apply requests are forwarded.
    pub fn set_propagate_apply(&self, propagate: bool) {
        self.propagate_apply.set(propagate);
    }

    /// Enters propagation.
    ///
    /// Returns `None` if this link is already propagating further up the
    /// stack; nested re-entry must then be ignored.
    #[must_use]
    pub fn enter(&self) -> Option<PropagationGuard<'_>> {
        if self.propagating.replace(true) {
            return None;
        }
        Some(PropagationGuard {
            flag: &self.propagating,
        })
    }

    /// Returns `true` while a propagation of this link is running.
    #[must_use]
    pub fn is_propagating(&self) -> bool {
        self.propagating.get()
    }

    /// Borrows the endpoints in insertion order.
    ///
    /// Do not hold the borrow across calls that mutate proxies.
    #[must_use]
    pub fn endpoints(&self) -> Ref<'_, [LinkEndpoint]> {
        Ref::map(self.endpoints.borrow(), Vec::as_slice)
    }

    /// Returns a copy of the endpoints, safe to hold across mutations.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LinkEndpoint> {
        self.endpoints.borrow().clone()
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.borrow().len()
    }

    /// Returns `true` if there are no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.borrow().is_empty()
    }

    /// Returns `true` if proxy `id` owns an INPUT endpoint.
    #[must_use]
    pub fn has_input(&self, id: ProxyId) -> bool {
        self.endpoints
            .borrow()
            .iter()
            .any(|e| e.direction().is_input() && e.owner_id() == Some(id))
    }

    /// Appends an endpoint and observes its target.
    ///
    /// Returns `false` if the direction is empty or an identical endpoint
    /// (same target, same roles) already exists.
    pub fn insert(&self, endpoint: LinkEndpoint) -> bool {
        if endpoint.direction().is_empty() {
            tracing::warn!(owner = ?endpoint.owner_id(), "link endpoint without direction ignored");
            return false;
        }
        {
            let mut endpoints = self.endpoints.borrow_mut();
            if endpoints
                .iter()
                .any(|e| e.direction() == endpoint.direction() && e.same_target(&endpoint))
            {
                return false;
            }
            endpoints.push(endpoint.clone());
        }
        self.observe(&endpoint);
        true
    }

    /// Removes the first endpoint matching `pred`.
    pub fn remove_first(&self, pred: impl Fn(&LinkEndpoint) -> bool) -> Option<LinkEndpoint> {
        let removed = {
            let mut endpoints = self.endpoints.borrow_mut();
            let index = endpoints.iter().position(pred)?;
            endpoints.remove(index)
        };
        self.unobserve_if_unused(&removed);
        Some(removed)
    }

    /// Removes every endpoint. Flags are untouched.
    pub fn clear(&self) {
        let removed = core::mem::take(&mut *self.endpoints.borrow_mut());
        for endpoint in &removed {
            self.unobserve_if_unused(endpoint);
        }
    }

    /// Drops every endpoint owned by a destroyed proxy.
    pub fn forget_proxy(&self, id: ProxyId) {
        let removed: Vec<LinkEndpoint> = {
            let mut endpoints = self.endpoints.borrow_mut();
            let (gone, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut *endpoints)
                .into_iter()
                .partition(|e| e.owner_id() == Some(id));
            *endpoints = kept;
            gone
        };
        if !removed.is_empty() {
            tracing::debug!(proxy = %id, endpoints = removed.len(), "endpoints of destroyed proxy removed");
        }
        for endpoint in &removed {
            self.unobserve_if_unused(endpoint);
        }
    }

    /// Writes one child per endpoint role.
    ///
    /// Free standing property handles have no identity to persist and are
    /// skipped with a warning.
    #[must_use]
    pub fn save_state(&self) -> LinkState {
        let mut state = LinkState::default();
        for endpoint in self.endpoints.borrow().iter() {
            let Some(id) = endpoint.owner_id() else {
                tracing::warn!(
                    property = endpoint.property_name(),
                    "free standing property endpoint not persisted"
                );
                continue;
            };
            for label in endpoint.direction().labels() {
                state.endpoints.push(EndpointState {
                    direction: Some(label.to_owned()),
                    id: Some(id.get()),
                    name: endpoint.property_name().map(str::to_owned),
                });
            }
        }
        state
    }

    /// Validates `state` and replaces the endpoints with it.
    ///
    /// With `named`, every child must carry a property name that exists on
    /// the resolved proxy. Children for the same target are merged into one
    /// endpoint carrying both roles. On error nothing changes.
    pub fn load_state(
        &self,
        state: &LinkState,
        locator: &dyn ProxyLocator,
        named: bool,
    ) -> Result<(), LinkStateError> {
        let mut loaded: Vec<LinkEndpoint> = Vec::with_capacity(state.endpoints.len());
        for (index, child) in state.endpoints.iter().enumerate() {
            let label = child
                .direction
                .as_deref()
                .ok_or(LinkStateError::MissingDirection { index })?;
            let direction =
                Direction::from_label(label).ok_or_else(|| LinkStateError::UnknownDirection {
                    index,
                    value: label.to_owned(),
                })?;
            let id = child.id.ok_or(LinkStateError::MissingId { index })?;
            let proxy = locator
                .locate(ProxyId::new(id))
                .ok_or(LinkStateError::UnresolvedProxy { index, id })?;
            let endpoint = if named {
                let name = child
                    .name
                    .as_deref()
                    .ok_or(LinkStateError::MissingName { index })?;
                if proxy.property(name).is_none() {
                    return Err(LinkStateError::UnknownProperty {
                        index,
                        id,
                        name: name.to_owned(),
                    });
                }
                LinkEndpoint::named(&proxy, name, direction)
            } else {
                LinkEndpoint::proxy(&proxy, direction)
            };
            match loaded.iter_mut().find(|e| e.same_target(&endpoint)) {
                Some(existing) => existing.add_direction(direction),
                None => loaded.push(endpoint),
            }
        }

        self.clear();
        for endpoint in loaded {
            self.insert(endpoint);
        }
        tracing::debug!(endpoints = self.len(), "link state loaded");
        Ok(())
    }

    fn observe(&self, endpoint: &LinkEndpoint) {
        if let Some(owner) = endpoint.owner() {
            owner.add_observer(self.observer.clone());
        }
        if let (EndpointTarget::Property(property), Some(observer)) =
            (endpoint.target(), &self.property_observer)
        {
            if endpoint.direction().is_input() {
                property.add_observer(observer.clone());
            }
        }
    }

    fn unobserve_if_unused(&self, removed: &LinkEndpoint) {
        let endpoints = self.snapshot();
        if let Some(owner) = removed.owner() {
            if !endpoints.iter().any(|e| e.owner_id() == Some(owner.id())) {
                owner.remove_observer(&self.observer);
            }
        }
        if let (EndpointTarget::Property(property), Some(observer)) =
            (removed.target(), &self.property_observer)
        {
            if !endpoints
                .iter()
                .any(|e| e.direction().is_input() && e.is_handle(property))
            {
                property.remove_observer(observer);
            }
        }
    }
}

impl Drop for LinkCore {
    fn drop(&mut self) {
        for endpoint in self.endpoints.get_mut().iter() {
            if let Some(owner) = endpoint.owner() {
                owner.remove_observer(&self.observer);
            }
            if let (EndpointTarget::Property(property), Some(observer)) =
                (endpoint.target(), &self.property_observer)
            {
                property.remove_observer(observer);
            }
        }
    }
}

impl core::fmt::Debug for LinkCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinkCore")
            .field("endpoints", &*self.endpoints.borrow())
            .field("enabled", &self.enabled.get())
            .field("propagate_apply", &self.propagate_apply.get())
            .field("propagating", &self.propagating.get())
            .finish_non_exhaustive()
    }
}
