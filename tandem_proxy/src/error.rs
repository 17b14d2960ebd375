// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::id::ProxyId;

/// Errors raised by the object space.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// No proxy kind is registered under `(group, name)`.
    #[error("no proxy kind registered as '{group}/{name}'")]
    UnknownDefinition {
        /// The requested group.
        group: String,
        /// The requested kind name.
        name: String,
    },
    /// The proxy kind does not declare the property.
    #[error("proxy {proxy} has no property named '{name}'")]
    UnknownProperty {
        /// The proxy that was addressed.
        proxy: ProxyId,
        /// The missing property name.
        name: String,
    },
    /// The space owning the template proxy no longer exists.
    #[error("the space that created proxy {0} has been dropped")]
    SpaceDropped(ProxyId),
}
