// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted link state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The persisted block of a link: one child per endpoint role.
///
/// An endpoint carrying both roles is written as two children, one per role.
/// Exception filters are not part of the block.
///
/// ```rust
/// use tandem_link::{EndpointState, LinkState};
///
/// let state = LinkState {
///     endpoints: vec![EndpointState::new("input", 4).with_name("Radius")],
/// };
/// assert_eq!(state.endpoints[0].id, Some(4));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkState {
    /// The endpoint children, in insertion order.
    #[serde(default)]
    pub endpoints: Vec<EndpointState>,
}

/// One persisted endpoint child.
///
/// Every field is optional on the wire so malformed blocks deserialize and
/// are rejected by `load_state` with a precise [`LinkStateError`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointState {
    /// `"input"` or `"output"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Identity of the proxy, resolved through a locator on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Property name, for property links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EndpointState {
    /// Creates a child for the proxy `id` in role `direction`.
    #[must_use]
    pub fn new(direction: &str, id: u32) -> Self {
        Self {
            direction: Some(direction.to_owned()),
            id: Some(id),
            name: None,
        }
    }

    /// Sets the property name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }
}

/// Reasons a persisted link block is rejected.
///
/// Loading validates every child before touching the link, so a failed load
/// leaves the link unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkStateError {
    /// A child has no direction.
    #[error("link endpoint {index} has no direction")]
    MissingDirection {
        /// Position of the child.
        index: usize,
    },
    /// A child's direction is neither `input` nor `output`.
    #[error("link endpoint {index} has unknown direction '{value}'")]
    UnknownDirection {
        /// Position of the child.
        index: usize,
        /// The rejected label.
        value: String,
    },
    /// A child has no proxy identity.
    #[error("link endpoint {index} has no proxy id")]
    MissingId {
        /// Position of the child.
        index: usize,
    },
    /// A property link child has no property name.
    #[error("link endpoint {index} has no property name")]
    MissingName {
        /// Position of the child.
        index: usize,
    },
    /// The proxy identity does not resolve.
    #[error("link endpoint {index} references proxy #{id}, which does not exist")]
    UnresolvedProxy {
        /// Position of the child.
        index: usize,
        /// The unresolved identity.
        id: u32,
    },
    /// The resolved proxy has no such property.
    #[error("link endpoint {index} references '{name}' on proxy #{id}, which has no such property")]
    UnknownProperty {
        /// Position of the child.
        index: usize,
        /// The resolved proxy.
        id: u32,
        /// The missing property.
        name: String,
    },
}
