// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The proxy space: factory, locator and dependency bookkeeping.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use hashbrown::HashMap;

use crate::definition::ProxyDefinition;
use crate::error::ProxyError;
use crate::graph::ProducerConsumerGraph;
use crate::id::ProxyId;
use crate::proxy::{Proxy, ProxyInner};
use crate::registry::DefinitionRegistry;
use crate::value::PropertyValue;

/// Resolves persisted proxy identities back to live proxies.
pub trait ProxyLocator {
    /// Returns the live proxy with identity `id`.
    fn locate(&self, id: ProxyId) -> Option<Proxy>;
}

impl<F> ProxyLocator for F
where
    F: Fn(ProxyId) -> Option<Proxy>,
{
    #[inline]
    fn locate(&self, id: ProxyId) -> Option<Proxy> {
        self(id)
    }
}

pub(crate) struct SpaceShared {
    registry: RefCell<DefinitionRegistry>,
    proxies: RefCell<HashMap<ProxyId, Weak<ProxyInner>>>,
    next_id: Cell<u32>,
    graph: RefCell<ProducerConsumerGraph>,
}

impl SpaceShared {
    /// Removes a destroyed proxy from the index and the graph.
    pub(crate) fn forget(&self, id: ProxyId) {
        self.proxies.borrow_mut().remove(&id);
        self.graph.borrow_mut().remove_proxy(id);
    }
}

/// One coherent object space.
///
/// The space is the factory for proxies (by `(group, name)`), the locator
/// used by persisted state, and the owner of the [`ProducerConsumerGraph`]
/// that proxy-valued properties maintain. The handle is cheap to clone; it
/// indexes proxies weakly and never keeps one alive.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxySpace, names};
///
/// let space = ProxySpace::new();
/// space.register(ProxyDefinitionBuilder::new("sources", "Sphere").build());
/// space.register(
///     ProxyDefinitionBuilder::new("representations", "Surface")
///         .property(names::INPUT, PropertyValue::Proxies(Vec::new()))
///         .build(),
/// );
///
/// let sphere = space.create("sources", "Sphere").unwrap();
/// let surface = space.create("representations", "Surface").unwrap();
/// surface
///     .set(names::INPUT, PropertyValue::Proxies(vec![sphere.id()]))
///     .unwrap();
///
/// let graph = space.graph();
/// assert_eq!(graph.consumers(sphere.id()).next().unwrap().proxy, surface.id());
/// ```
#[derive(Clone)]
pub struct ProxySpace {
    shared: Rc<SpaceShared>,
}

impl Default for ProxySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySpace {
    /// Creates an empty space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(DefinitionRegistry::new())
    }

    /// Creates a space over an existing registry.
    #[must_use]
    pub fn with_registry(registry: DefinitionRegistry) -> Self {
        Self {
            shared: Rc::new(SpaceShared {
                registry: RefCell::new(registry),
                proxies: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
                graph: RefCell::new(ProducerConsumerGraph::new()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<SpaceShared>) -> Self {
        Self { shared }
    }

    /// Registers a proxy kind; see [`DefinitionRegistry::register`].
    pub fn register(&self, definition: ProxyDefinition) -> Rc<ProxyDefinition> {
        self.shared.registry.borrow_mut().register(definition)
    }

    /// Looks up a proxy kind.
    #[must_use]
    pub fn definition(&self, group: &str, name: &str) -> Option<Rc<ProxyDefinition>> {
        self.shared.registry.borrow().get(group, name).cloned()
    }

    /// Instantiates a proxy of kind `(group, name)` with default values.
    pub fn create(&self, group: &str, name: &str) -> Result<Proxy, ProxyError> {
        let definition =
            self.definition(group, name)
                .ok_or_else(|| ProxyError::UnknownDefinition {
                    group: group.to_owned(),
                    name: name.to_owned(),
                })?;
        let id = ProxyId::new(self.shared.next_id.get());
        self.shared.next_id.set(id.get() + 1);

        let inner = ProxyInner::new_cyclic(id, definition, Rc::downgrade(&self.shared));
        self.shared
            .proxies
            .borrow_mut()
            .insert(id, Rc::downgrade(&inner));
        let proxy = Proxy::from_inner(inner);

        // Defaults may already reference other proxies.
        self.with_graph(|graph| {
            for property in proxy.properties() {
                property.with_value(|v| {
                    for referenced in v.proxies() {
                        graph.add_reference(id, property.name(), *referenced);
                    }
                });
            }
        });
        tracing::debug!(proxy = %id, group, kind = name, "proxy created");
        Ok(proxy)
    }

    /// Instantiates a new proxy of the same concrete kind as `template`.
    ///
    /// No property values are copied.
    pub fn create_like(&self, template: &Proxy) -> Result<Proxy, ProxyError> {
        self.create(template.group(), template.kind())
    }

    /// Returns the live proxy with identity `id`.
    #[must_use]
    pub fn locate(&self, id: ProxyId) -> Option<Proxy> {
        self.shared
            .proxies
            .borrow()
            .get(&id)
            .and_then(Weak::upgrade)
            .map(Proxy::from_inner)
    }

    /// Returns the number of live proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared
            .proxies
            .borrow()
            .values()
            .filter(|p| p.strong_count() > 0)
            .count()
    }

    /// Returns `true` if no proxy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every live proxy ordered by identity.
    #[must_use]
    pub fn proxies(&self) -> Vec<Proxy> {
        let mut proxies: Vec<Proxy> = self
            .shared
            .proxies
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .map(Proxy::from_inner)
            .collect();
        proxies.sort_by_key(Proxy::id);
        proxies
    }

    /// Borrows the producer/consumer graph.
    ///
    /// # Panics
    ///
    /// Panics if called while the graph is being updated, which only happens
    /// from inside [`with_graph`](Self::with_graph).
    #[must_use]
    pub fn graph(&self) -> Ref<'_, ProducerConsumerGraph> {
        self.shared.graph.borrow()
    }

    /// Runs `f` with mutable access to the producer/consumer graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut ProducerConsumerGraph) -> R) -> R {
        f(&mut self.shared.graph.borrow_mut())
    }

    /// Recomputes every producer/consumer edge from live property values.
    ///
    /// References to proxies that no longer resolve are dropped from the
    /// referencing property (without notifications) and reported with a
    /// warning rather than failing the rebuild. Returns the number of
    /// references skipped.
    pub fn rebuild_dependencies(&self) -> usize {
        let proxies = self.proxies();
        let mut skipped = 0;
        let mut graph = ProducerConsumerGraph::new();
        for proxy in &proxies {
            for property in proxy.properties() {
                let ids: Vec<ProxyId> = property.with_value(|v| v.proxies().to_vec());
                if ids.is_empty() {
                    continue;
                }
                let mut kept = Vec::with_capacity(ids.len());
                for referenced in ids.iter().copied() {
                    if self.locate(referenced).is_some() {
                        graph.add_reference(proxy.id(), property.name(), referenced);
                        kept.push(referenced);
                    } else {
                        skipped += 1;
                        tracing::warn!(
                            proxy = %proxy.id(),
                            property = property.name(),
                            %referenced,
                            "skipping unresolved proxy reference"
                        );
                    }
                }
                if kept.len() != ids.len() {
                    property.replace_silently(PropertyValue::Proxies(kept));
                }
            }
        }
        *self.shared.graph.borrow_mut() = graph;
        skipped
    }

    /// Returns `true` if both handles address the same space.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.shared, &b.shared)
    }
}

impl ProxyLocator for ProxySpace {
    fn locate(&self, id: ProxyId) -> Option<Proxy> {
        Self::locate(self, id)
    }
}

impl core::fmt::Debug for ProxySpace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProxySpace")
            .field("registry", &*self.shared.registry.borrow())
            .field("live", &self.len())
            .field("next_id", &self.shared.next_id.get())
            .finish_non_exhaustive()
    }
}
