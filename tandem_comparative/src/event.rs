// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Notifications raised by a comparative grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GridEvent {
    /// The grid was (re)built; views or their layout changed.
    LayoutChanged,
    /// A representation was added to or removed from the grid.
    RepresentationSetChanged,
}

/// A subscribed listener.
pub(crate) type Listener = Box<dyn FnMut(&GridEvent)>;
