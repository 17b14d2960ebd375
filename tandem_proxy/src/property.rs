// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property handles.
//!
//! A [`PropertyRef`] is a shared handle to one named property. Properties have
//! identity: two handles compare equal under [`PropertyRef::ptr_eq`] only if
//! they address the same slot. Most properties belong to a [`Proxy`]; free
//! standing properties (no owner) are also supported for property links.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::id::ProxyId;
use crate::proxy::{Proxy, ProxyInner};
use crate::value::PropertyValue;

/// Receives `Modified` notifications from properties.
///
/// Observers are held weakly; an observer that has been dropped is pruned on
/// the next notification.
pub trait PropertyObserver {
    /// Called after the value of `property` changed.
    fn property_modified(&self, property: &PropertyRef);
}

/// A shared handle to one property.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::{PropertyRef, PropertyValue};
///
/// let a = PropertyRef::new("Radius", 0.5);
/// let b = PropertyRef::new("Radius", 1.0);
///
/// assert!(b.copy_from(&a));
/// assert_eq!(b.get(), PropertyValue::Double(0.5));
/// assert!(!PropertyRef::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct PropertyRef {
    inner: Rc<PropertyInner>,
}

struct PropertyInner {
    name: String,
    value: RefCell<PropertyValue>,
    /// The value last pushed to the resource side, if any.
    pushed: RefCell<Option<PropertyValue>>,
    /// Set on every change, cleared on push.
    modified: Cell<bool>,
    owner: Weak<ProxyInner>,
    owner_id: Option<ProxyId>,
    observers: RefCell<Vec<Weak<dyn PropertyObserver>>>,
}

impl PropertyRef {
    /// Creates a free standing property with no owning proxy.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::build(name.into(), value.into(), Weak::new(), None)
    }

    pub(crate) fn owned(
        name: &str,
        value: PropertyValue,
        owner: Weak<ProxyInner>,
        owner_id: ProxyId,
    ) -> Self {
        Self::build(name.to_owned(), value, owner, Some(owner_id))
    }

    fn build(
        name: String,
        value: PropertyValue,
        owner: Weak<ProxyInner>,
        owner_id: Option<ProxyId>,
    ) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                name,
                value: RefCell::new(value),
                pushed: RefCell::new(None),
                modified: Cell::new(false),
                owner,
                owner_id,
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> PropertyValue {
        self.inner.value.borrow().clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with_value<R>(&self, f: impl FnOnce(&PropertyValue) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Assigns a new value.
    ///
    /// Assigning an equal value is a no-op and raises no notification.
    /// Otherwise the property is marked modified, proxy references are
    /// re-counted in the owner's space, property observers are notified, and
    /// finally the owner raises `property_changed`.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, value: impl Into<PropertyValue>) -> bool {
        let value = value.into();
        let old = {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                return false;
            }
            core::mem::replace(&mut *slot, value)
        };
        self.inner.modified.set(true);

        let owner = self.owner();
        if let Some(owner) = &owner {
            let new_refs: SmallVec<[ProxyId; 4]> =
                self.with_value(|v| v.proxies().iter().copied().collect());
            if !new_refs.is_empty() || !old.proxies().is_empty() {
                owner.retarget_references(self.name(), old.proxies(), &new_refs);
            }
        }

        tracing::trace!(property = self.name(), owner = ?self.inner.owner_id, "property modified");
        for observer in self.observers_snapshot() {
            observer.property_modified(self);
        }
        if let Some(owner) = owner {
            owner.notify_property_changed(self.name());
        }
        true
    }

    /// Copies the value of `other` into this property.
    ///
    /// This is an attribute-for-attribute assignment; the two properties stay
    /// independent afterwards. Returns `true` if the value changed.
    pub fn copy_from(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return false;
        }
        self.set(other.get())
    }

    /// Returns `true` if the value changed since it was last pushed.
    #[must_use]
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.inner.modified.get()
    }

    /// Returns the value last pushed to the resource side.
    #[must_use]
    pub fn pushed_value(&self) -> Option<PropertyValue> {
        self.inner.pushed.borrow().clone()
    }

    /// Pushes the current value to the resource side if it is modified.
    ///
    /// Returns `true` if anything was pushed.
    pub(crate) fn push(&self) -> bool {
        if !self.inner.modified.replace(false) {
            return false;
        }
        *self.inner.pushed.borrow_mut() = Some(self.get());
        true
    }

    /// Overwrites the value without notifications or bookkeeping.
    ///
    /// Used by load paths that rebuild dependent state themselves.
    pub(crate) fn replace_silently(&self, value: PropertyValue) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Returns the owning proxy, if it is still alive.
    #[must_use]
    pub fn owner(&self) -> Option<Proxy> {
        self.inner.owner.upgrade().map(Proxy::from_inner)
    }

    /// Returns the identity of the owning proxy, even if it was dropped.
    #[must_use]
    #[inline]
    pub fn owner_id(&self) -> Option<ProxyId> {
        self.inner.owner_id
    }

    /// Returns `true` if both handles address the same property.
    #[must_use]
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Registers an observer; registering the same observer twice is a no-op.
    pub fn add_observer(&self, observer: Weak<dyn PropertyObserver>) {
        let mut observers = self.inner.observers.borrow_mut();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Unregisters an observer.
    pub fn remove_observer(&self, observer: &Weak<dyn PropertyObserver>) {
        self.inner
            .observers
            .borrow_mut()
            .retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Returns the number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    fn observers_snapshot(&self) -> SmallVec<[Rc<dyn PropertyObserver>; 4]> {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|o| o.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl core::fmt::Debug for PropertyRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRef")
            .field("name", &self.inner.name)
            .field("owner", &self.inner.owner_id)
            .field("value", &*self.inner.value.borrow())
            .field("modified", &self.inner.modified.get())
            .finish_non_exhaustive()
    }
}
