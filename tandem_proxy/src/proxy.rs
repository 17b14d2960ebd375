// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proxy handles and proxy observers.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::definition::{ProxyDefinition, ProxyFlags};
use crate::error::ProxyError;
use crate::id::ProxyId;
use crate::names;
use crate::property::PropertyRef;
use crate::space::{ProxySpace, SpaceShared};
use crate::value::PropertyValue;

/// A camera gesture raised on a view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// A gesture started.
    Begin,
    /// The view rendered as part of a gesture.
    Render {
        /// `true` for low-latency renders during a gesture.
        interactive: bool,
    },
    /// A gesture ended.
    End,
    /// The camera was reset to fit the scene.
    ResetCamera,
}

/// Receives notifications raised by proxies.
///
/// Every notification is delivered synchronously, on the stack of the
/// mutation that raised it. Observers are held weakly and may freely mutate
/// other proxies (including the one notifying) from inside a callback.
pub trait ProxyObserver {
    /// A property of `proxy` changed value.
    fn property_changed(&self, proxy: &Proxy, name: &str);

    /// `proxy` pushed its pending property values to the resource side.
    fn resource_updated(&self, _proxy: &Proxy) {}

    /// `proxy` pushed one property to the resource side.
    fn property_pushed(&self, _proxy: &Proxy, _name: &str) {}

    /// A camera gesture happened on `proxy`.
    fn interaction(&self, _proxy: &Proxy, _event: Interaction) {}

    /// The proxy identified by `id` was destroyed.
    fn proxy_destroyed(&self, _id: ProxyId) {}
}

/// Counters describing the pipeline side of a proxy.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PipelineState {
    /// Bumped by every dirty mark that was not absorbed by the cache.
    pub data_generation: u64,
    /// Dirty marks swallowed because cache forcing was pushed as `true`.
    pub absorbed_marks: u64,
    /// Number of pipeline updates.
    pub update_count: u64,
    /// Time of the most recent pipeline update.
    pub last_update_time: Option<f64>,
    /// Number of still renders.
    pub still_renders: u64,
    /// Number of interactive renders.
    pub interactive_renders: u64,
}

pub(crate) struct ProxyInner {
    id: ProxyId,
    definition: Rc<ProxyDefinition>,
    properties: SmallVec<[PropertyRef; 8]>,
    observers: RefCell<Vec<Weak<dyn ProxyObserver>>>,
    pipeline: Cell<PipelineState>,
    space: Weak<SpaceShared>,
}

impl ProxyInner {
    pub(crate) fn new_cyclic(
        id: ProxyId,
        definition: Rc<ProxyDefinition>,
        space: Weak<SpaceShared>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| {
            let properties = definition
                .properties()
                .iter()
                .map(|p| PropertyRef::owned(p.name(), p.default_value().clone(), this.clone(), id))
                .collect();
            Self {
                id,
                definition,
                properties,
                observers: RefCell::new(Vec::new()),
                pipeline: Cell::new(PipelineState::default()),
                space,
            }
        })
    }
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        tracing::debug!(proxy = %self.id, kind = self.definition.name(), "proxy destroyed");
        let observers: SmallVec<[Rc<dyn ProxyObserver>; 4]> = self
            .observers
            .get_mut()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for observer in observers {
            observer.proxy_destroyed(self.id);
        }
        if let Some(space) = self.space.upgrade() {
            space.forget(self.id);
        }
    }
}

/// A shared handle to a proxy.
///
/// Cloning the handle shares the proxy; the proxy is destroyed when the last
/// strong handle goes away.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxySpace};
///
/// let space = ProxySpace::new();
/// space.register(
///     ProxyDefinitionBuilder::new("sources", "Sphere")
///         .property("Radius", 0.5)
///         .build(),
/// );
///
/// let sphere = space.create("sources", "Sphere").unwrap();
/// sphere.set("Radius", 2.0).unwrap();
/// assert_eq!(sphere.get("Radius"), Some(PropertyValue::Double(2.0)));
///
/// // Push the modified property to the resource side.
/// assert!(sphere.update_resource());
/// assert!(!sphere.property("Radius").unwrap().is_modified());
/// ```
#[derive(Clone)]
pub struct Proxy {
    inner: Rc<ProxyInner>,
}

impl Proxy {
    pub(crate) fn from_inner(inner: Rc<ProxyInner>) -> Self {
        Self { inner }
    }

    /// Returns the identity of this proxy.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ProxyId {
        self.inner.id
    }

    /// Returns the definition group of this proxy's kind.
    #[must_use]
    pub fn group(&self) -> &str {
        self.inner.definition.group()
    }

    /// Returns the kind name of this proxy.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.inner.definition.name()
    }

    /// Returns the definition this proxy was created from.
    #[must_use]
    pub fn definition(&self) -> &Rc<ProxyDefinition> {
        &self.inner.definition
    }

    /// Returns `true` if this proxy's kind can be rendered.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.inner.definition.flags().contains(ProxyFlags::RENDERABLE)
    }

    /// Returns the space that created this proxy, if it still exists.
    #[must_use]
    pub fn space(&self) -> Option<ProxySpace> {
        self.inner.space.upgrade().map(ProxySpace::from_shared)
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyRef> {
        self.inner
            .properties
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Returns all properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyRef> + '_ {
        self.inner.properties.iter()
    }

    /// Returns a copy of a property's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.property(name).map(|p| p.get())
    }

    /// Assigns a property value; see [`PropertyRef::set`].
    ///
    /// Returns whether the value changed.
    pub fn set(&self, name: &str, value: impl Into<PropertyValue>) -> Result<bool, ProxyError> {
        let property = self.property(name).ok_or_else(|| ProxyError::UnknownProperty {
            proxy: self.id(),
            name: name.to_owned(),
        })?;
        Ok(property.set(value))
    }

    /// Pushes one modified property to the resource side.
    ///
    /// Raises `property_pushed` and returns `true` if the property was
    /// modified; unknown or unmodified properties are a no-op.
    pub fn update_property(&self, name: &str) -> bool {
        let Some(property) = self.property(name) else {
            tracing::debug!(proxy = %self.id(), property = name, "push of unknown property ignored");
            return false;
        };
        if !property.push() {
            return false;
        }
        for observer in self.observers_snapshot() {
            observer.property_pushed(self, name);
        }
        true
    }

    /// Pushes every modified property to the resource side.
    ///
    /// Raises `resource_updated` and returns `true` if anything was pushed.
    pub fn update_resource(&self) -> bool {
        let mut pushed = false;
        for property in &self.inner.properties {
            pushed |= property.push();
        }
        if pushed {
            for observer in self.observers_snapshot() {
                observer.resource_updated(self);
            }
        }
        pushed
    }

    /// Marks the data pipeline dirty.
    ///
    /// While `ForceUseCache` is pushed as `true` the mark is absorbed and the
    /// cached result stays in use.
    pub fn mark_dirty(&self) {
        let forced = self
            .property(names::FORCE_USE_CACHE)
            .and_then(|p| p.pushed_value())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let mut state = self.inner.pipeline.get();
        if forced {
            state.absorbed_marks += 1;
            tracing::trace!(proxy = %self.id(), "dirty mark absorbed by forced cache");
        } else {
            state.data_generation += 1;
        }
        self.inner.pipeline.set(state);
    }

    /// Pushes pending values and brings the pipeline up to date at `time`.
    pub fn update_pipeline(&self, time: f64) {
        self.update_resource();
        let mut state = self.inner.pipeline.get();
        state.update_count += 1;
        state.last_update_time = Some(time);
        self.inner.pipeline.set(state);
    }

    /// Renders the proxy.
    ///
    /// Pending property values are pushed first. Rendering a proxy whose kind
    /// is not renderable is ignored.
    pub fn render(&self, interactive: bool) {
        if !self.is_renderable() {
            tracing::debug!(proxy = %self.id(), kind = self.kind(), "render of non-renderable proxy ignored");
            return;
        }
        self.update_resource();
        let mut state = self.inner.pipeline.get();
        if interactive {
            state.interactive_renders += 1;
        } else {
            state.still_renders += 1;
        }
        self.inner.pipeline.set(state);
    }

    /// Raises a camera gesture.
    ///
    /// [`Interaction::Render`] renders this proxy before observers are told.
    pub fn interact(&self, event: Interaction) {
        if let Interaction::Render { interactive } = event {
            self.render(interactive);
        }
        for observer in self.observers_snapshot() {
            observer.interaction(self, event);
        }
    }

    /// Returns the pipeline counters.
    #[must_use]
    pub fn pipeline(&self) -> PipelineState {
        self.inner.pipeline.get()
    }

    /// Registers an observer; registering the same observer twice is a no-op.
    pub fn add_observer(&self, observer: Weak<dyn ProxyObserver>) {
        let mut observers = self.inner.observers.borrow_mut();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Unregisters an observer.
    pub fn remove_observer(&self, observer: &Weak<dyn ProxyObserver>) {
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

    /// Creates a weak handle to this proxy.
    #[must_use]
    pub fn downgrade(&self) -> WeakProxy {
        WeakProxy {
            id: self.id(),
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if both handles address the same proxy.
    #[must_use]
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn notify_property_changed(&self, name: &str) {
        for observer in self.observers_snapshot() {
            observer.property_changed(self, name);
        }
    }

    /// Re-counts the proxy references held through `name`.
    pub(crate) fn retarget_references(&self, name: &str, old: &[ProxyId], new: &[ProxyId]) {
        let Some(space) = self.space() else {
            return;
        };
        // Add before removing so references kept across the change never
        // drop to zero.
        space.with_graph(|graph| {
            for referenced in new {
                graph.add_reference(self.id(), name, *referenced);
            }
            for referenced in old {
                graph.remove_reference(self.id(), name, *referenced);
            }
        });
    }

    fn observers_snapshot(&self) -> SmallVec<[Rc<dyn ProxyObserver>; 4]> {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|o| o.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for Proxy {}

impl core::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id())
            .field("group", &self.group())
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// A weak handle to a proxy that remembers the proxy's identity.
#[derive(Clone)]
pub struct WeakProxy {
    id: ProxyId,
    inner: Weak<ProxyInner>,
}

impl WeakProxy {
    /// Returns the identity of the referenced proxy.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Upgrades to a strong handle if the proxy is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Proxy> {
        self.inner.upgrade().map(Proxy::from_inner)
    }

    /// Returns `true` if the proxy is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl core::fmt::Debug for WeakProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakProxy")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
