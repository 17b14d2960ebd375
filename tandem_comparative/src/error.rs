// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tandem_proxy::{ProxyError, ProxyId};
use thiserror::Error;

/// Errors raised by [`ComparativeGridManager`](crate::ComparativeGridManager).
///
/// Every error is raised before the manager mutates anything.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Grid dimensions must both be positive.
    #[error("invalid grid dimensions {dx}x{dy}")]
    InvalidDimensions {
        /// Requested columns.
        dx: u32,
        /// Requested rows.
        dy: u32,
    },
    /// The manager has no root view yet.
    #[error("comparative grid is not initialized")]
    NotInitialized,
    /// The root view cannot be removed from its own grid.
    #[error("view {view} is the root view and cannot be removed")]
    RootViewRemoval {
        /// The root view.
        view: ProxyId,
    },
    /// The representation is not tracked by the grid.
    #[error("representation {representation} is not tracked by the grid")]
    UntrackedRepresentation {
        /// The untracked representation.
        representation: ProxyId,
    },
    /// A cue animates a proxy that no longer exists.
    #[error("cue {cue} animates a destroyed proxy")]
    CueTargetLost {
        /// Position of the cue in the manager.
        cue: usize,
    },
    /// Creating a clone failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}
