// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tandem_proxy::{PropertyRef, Proxy, ProxyId, WeakProxy};

use crate::direction::Direction;

/// What an endpoint points at.
#[derive(Clone, Debug)]
pub enum EndpointTarget {
    /// A proxy, or one named property of a proxy. The proxy is not owned.
    Proxy {
        /// The observed proxy.
        proxy: WeakProxy,
        /// The property name, for property links.
        property: Option<String>,
    },
    /// A property handle, possibly free standing.
    Property(PropertyRef),
}

/// One end of a link.
#[derive(Clone, Debug)]
pub struct LinkEndpoint {
    target: EndpointTarget,
    direction: Direction,
}

impl LinkEndpoint {
    /// An endpoint addressing a whole proxy.
    #[must_use]
    pub fn proxy(proxy: &Proxy, direction: Direction) -> Self {
        Self {
            target: EndpointTarget::Proxy {
                proxy: proxy.downgrade(),
                property: None,
            },
            direction,
        }
    }

    /// An endpoint addressing property `name` of `proxy`.
    #[must_use]
    pub fn named(proxy: &Proxy, name: &str, direction: Direction) -> Self {
        Self {
            target: EndpointTarget::Proxy {
                proxy: proxy.downgrade(),
                property: Some(name.to_owned()),
            },
            direction,
        }
    }

    /// An endpoint addressing a property handle directly.
    #[must_use]
    pub fn property(property: &PropertyRef, direction: Direction) -> Self {
        Self {
            target: EndpointTarget::Property(property.clone()),
            direction,
        }
    }

    /// Returns what the endpoint points at.
    #[must_use]
    pub fn target(&self) -> &EndpointTarget {
        &self.target
    }

    /// Returns the endpoint's role mask.
    #[must_use]
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn add_direction(&mut self, direction: Direction) {
        self.direction |= direction;
    }

    /// Returns the identity of the proxy this endpoint belongs to.
    #[must_use]
    pub fn owner_id(&self) -> Option<ProxyId> {
        match &self.target {
            EndpointTarget::Proxy { proxy, .. } => Some(proxy.id()),
            EndpointTarget::Property(property) => property.owner_id(),
        }
    }

    /// Returns the proxy this endpoint belongs to, if it is alive.
    #[must_use]
    pub fn owner(&self) -> Option<Proxy> {
        match &self.target {
            EndpointTarget::Proxy { proxy, .. } => proxy.upgrade(),
            EndpointTarget::Property(property) => property.owner(),
        }
    }

    /// Returns the addressed property name, if the endpoint addresses one.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        match &self.target {
            EndpointTarget::Proxy { property, .. } => property.as_deref(),
            EndpointTarget::Property(property) => Some(property.name()),
        }
    }

    /// Resolves the addressed property.
    ///
    /// Whole-proxy endpoints and endpoints of destroyed proxies resolve to
    /// `None`.
    #[must_use]
    pub fn resolve(&self) -> Option<PropertyRef> {
        match &self.target {
            EndpointTarget::Proxy {
                proxy,
                property: Some(name),
            } => proxy.upgrade()?.property(name),
            EndpointTarget::Proxy { property: None, .. } => None,
            EndpointTarget::Property(property) => Some(property.clone()),
        }
    }

    /// Returns `true` if this endpoint addresses the same target as `other`.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (
                EndpointTarget::Proxy { proxy, property },
                EndpointTarget::Proxy {
                    proxy: other_proxy,
                    property: other_property,
                },
            ) => proxy.id() == other_proxy.id() && property == other_property,
            (EndpointTarget::Property(a), EndpointTarget::Property(b)) => PropertyRef::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns `true` if this endpoint addresses the whole proxy `id`.
    pub(crate) fn is_proxy(&self, id: ProxyId) -> bool {
        matches!(&self.target, EndpointTarget::Proxy { proxy, property: None } if proxy.id() == id)
    }

    /// Returns `true` if this endpoint addresses `id.name` by name.
    pub(crate) fn is_named(&self, id: ProxyId, name: &str) -> bool {
        matches!(
            &self.target,
            EndpointTarget::Proxy { proxy, property: Some(p) } if proxy.id() == id && p == name
        )
    }

    /// Returns `true` if this endpoint resolves to `id.name`, by name or by handle.
    pub(crate) fn addresses(&self, id: ProxyId, name: &str) -> bool {
        self.owner_id() == Some(id) && self.property_name() == Some(name)
    }

    pub(crate) fn is_handle(&self, property: &PropertyRef) -> bool {
        matches!(&self.target, EndpointTarget::Property(p) if PropertyRef::ptr_eq(p, property))
    }
}
