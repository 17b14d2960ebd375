// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proxy identification.

use core::fmt;

/// A runtime proxy identifier.
///
/// Identifiers are allocated monotonically by a [`ProxySpace`](crate::ProxySpace)
/// and are never reused within that space, so they double as the persisted
/// identity written by link state.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::ProxyId;
///
/// let id = ProxyId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(u32);

impl ProxyId {
    /// Creates a proxy ID from its raw value.
    ///
    /// This is typically called by the space rather than directly; it is
    /// public so persisted identifiers can be turned back into IDs.
    #[must_use]
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyId").field(&self.0).finish()
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
