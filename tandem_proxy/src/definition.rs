// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proxy kind definitions.
//!
//! This module provides [`ProxyDefinition`] describing one concrete proxy kind
//! and [`ProxyDefinitionBuilder`] for ergonomic construction.

use smallvec::SmallVec;

use crate::value::PropertyValue;

bitflags::bitflags! {
    /// Capabilities of a proxy kind.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ProxyFlags: u8 {
        /// Proxies of this kind can be rendered (views).
        const RENDERABLE = 0b0000_0001;
    }
}

/// One property slot of a proxy kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDefinition {
    name: String,
    default: PropertyValue,
}

impl PropertyDefinition {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value a freshly created proxy starts with.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }
}

/// The definition of a concrete proxy kind, identified by `(group, name)`.
///
/// Property order is the declaration order and is preserved by every proxy of
/// this kind.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxyFlags};
///
/// let definition = ProxyDefinitionBuilder::new("views", "RenderView")
///     .flags(ProxyFlags::RENDERABLE)
///     .property("ViewTime", 0.0)
///     .property("ViewSize", PropertyValue::ints([400, 400]))
///     .build();
///
/// assert_eq!(definition.group(), "views");
/// assert!(definition.flags().contains(ProxyFlags::RENDERABLE));
/// assert_eq!(definition.properties().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyDefinition {
    group: String,
    name: String,
    flags: ProxyFlags,
    properties: SmallVec<[PropertyDefinition; 8]>,
}

impl ProxyDefinition {
    /// Returns the definition group (for example `"views"`).
    #[must_use]
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the kind name within the group.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the capability flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> ProxyFlags {
        self.flags
    }

    /// Returns the property slots in declaration order.
    #[must_use]
    #[inline]
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    /// Looks up a property slot by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Builder for [`ProxyDefinition`].
#[derive(Debug)]
pub struct ProxyDefinitionBuilder {
    definition: ProxyDefinition,
}

impl ProxyDefinitionBuilder {
    /// Starts a definition for the `(group, name)` kind.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            definition: ProxyDefinition {
                group: group.into(),
                name: name.into(),
                flags: ProxyFlags::empty(),
                properties: SmallVec::new(),
            },
        }
    }

    /// Sets the capability flags.
    #[must_use]
    pub fn flags(mut self, flags: ProxyFlags) -> Self {
        self.definition.flags = flags;
        self
    }

    /// Declares a property with its default value.
    ///
    /// # Panics
    ///
    /// Panics if a property with the same name was already declared.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, default: impl Into<PropertyValue>) -> Self {
        let name = name.into();
        assert!(
            self.definition.property(&name).is_none(),
            "Property '{name}' is declared twice on {}/{}",
            self.definition.group,
            self.definition.name
        );
        self.definition.properties.push(PropertyDefinition {
            name,
            default: default.into(),
        });
        self
    }

    /// Builds the definition.
    #[must_use]
    pub fn build(self) -> ProxyDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let definition = ProxyDefinitionBuilder::new("representations", "Surface")
            .property("Visibility", true)
            .property("Opacity", 1.0)
            .property("Input", PropertyValue::Proxies(Vec::new()))
            .build();

        let names: Vec<_> = definition.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["Visibility", "Opacity", "Input"]);
        assert_eq!(
            definition.property("Opacity").map(|p| p.default_value()),
            Some(&PropertyValue::Double(1.0))
        );
        assert!(definition.flags().is_empty());
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn duplicate_property_panics() {
        let _ = ProxyDefinitionBuilder::new("sources", "Sphere")
            .property("Radius", 0.5)
            .property("Radius", 1.0);
    }
}
