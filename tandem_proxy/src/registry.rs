// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Definition registry.
//!
//! This module provides [`DefinitionRegistry`] for registering and looking up
//! proxy kinds by `(group, name)`.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::definition::ProxyDefinition;

/// A registry of proxy kinds.
///
/// Kinds are registered once at startup; the [`ProxySpace`](crate::ProxySpace)
/// instantiates proxies from them. Definitions are shared, so every proxy of
/// a kind points at the same definition.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::{DefinitionRegistry, ProxyDefinitionBuilder};
///
/// let mut registry = DefinitionRegistry::new();
/// registry.register(
///     ProxyDefinitionBuilder::new("sources", "Sphere")
///         .property("Radius", 0.5)
///         .build(),
/// );
///
/// assert!(registry.get("sources", "Sphere").is_some());
/// assert!(registry.get("sources", "Cone").is_none());
/// ```
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: Vec<Rc<ProxyDefinition>>,
    /// `group -> name -> index into definitions`.
    by_group: HashMap<String, HashMap<String, usize>>,
}

impl DefinitionRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a proxy kind.
    ///
    /// # Panics
    ///
    /// Panics if the `(group, name)` pair is already registered.
    pub fn register(&mut self, definition: ProxyDefinition) -> Rc<ProxyDefinition> {
        assert!(
            self.get(definition.group(), definition.name()).is_none(),
            "Proxy kind '{}/{}' is already registered",
            definition.group(),
            definition.name()
        );
        let definition = Rc::new(definition);
        self.by_group
            .entry(definition.group().to_owned())
            .or_default()
            .insert(definition.name().to_owned(), self.definitions.len());
        self.definitions.push(Rc::clone(&definition));
        definition
    }

    /// Returns the number of registered kinds.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if no kinds are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Looks up a kind by `(group, name)`.
    #[must_use]
    pub fn get(&self, group: &str, name: &str) -> Option<&Rc<ProxyDefinition>> {
        let index = *self.by_group.get(group)?.get(name)?;
        self.definitions.get(index)
    }

    /// Returns an iterator over all registered kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<ProxyDefinition>> {
        self.definitions.iter()
    }
}

impl core::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("count", &self.definitions.len())
            .field("groups", &self.by_group.keys().collect::<Vec<_>>())
            .finish()
    }
}
