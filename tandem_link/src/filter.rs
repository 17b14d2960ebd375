// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashSet;

/// Property names excluded from an object link's propagation.
///
/// The filter applies to every endpoint regardless of its direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionFilter {
    names: HashSet<String>,
}

impl ExceptionFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes `name`. Returns `false` if it was already excluded.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_owned())
    }

    /// Stops excluding `name`. Returns `false` if it was not excluded.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Returns `true` if `name` is excluded.
    #[must_use]
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the number of excluded names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the excluded names in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for ExceptionFilter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut filter = Self::new();
        for name in iter {
            filter.insert(name);
        }
        filter
    }
}
