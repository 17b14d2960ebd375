// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producer/consumer graph between proxies.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::id::ProxyId;

/// One end of a producer/consumer edge: a proxy and the referencing property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// The proxy on the other end of the edge.
    pub proxy: ProxyId,
    /// The property through which the reference is held.
    pub property: String,
}

type Edges = SmallVec<[Dependency; 2]>;

/// Reference-counted producer/consumer edges.
///
/// When property `p` of proxy `owner` references proxy `r`, `r` produces data
/// that `owner` consumes: `r` gets a consumer edge `(owner, p)` and `owner`
/// gets a producer edge `(r, p)`. Repeated references through the same
/// property share one edge; the edge exists while the count is positive.
///
/// # Example
///
/// ```
/// use tandem_proxy::{ProducerConsumerGraph, ProxyId};
///
/// let source = ProxyId::new(1);
/// let repr = ProxyId::new(2);
///
/// let mut graph = ProducerConsumerGraph::new();
/// assert!(graph.add_reference(repr, "Input", source));
/// assert!(!graph.add_reference(repr, "Input", source)); // counted, no new edge
///
/// assert_eq!(graph.consumers(source).count(), 1);
/// assert_eq!(graph.producers(repr).count(), 1);
///
/// assert!(!graph.remove_reference(repr, "Input", source));
/// assert!(graph.remove_reference(repr, "Input", source)); // 1 -> 0 drops the edge
/// assert!(graph.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProducerConsumerGraph {
    /// `owner -> property -> referenced -> count`.
    counts: HashMap<ProxyId, HashMap<String, HashMap<ProxyId, u32>>>,
    /// Consumer edges: `consumers[r]` lists `(owner, property)` consuming `r`.
    consumers: HashMap<ProxyId, Edges>,
    /// Producer edges: `producers[owner]` lists `(r, property)` feeding `owner`.
    producers: HashMap<ProxyId, Edges>,
}

impl ProducerConsumerGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no edges exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.values().all(|e| e.is_empty())
    }

    /// Records one reference from `owner.property` to `referenced`.
    ///
    /// Returns `true` if this was the first live reference, i.e. the edges
    /// were created.
    pub fn add_reference(&mut self, owner: ProxyId, property: &str, referenced: ProxyId) -> bool {
        let count = self
            .counts
            .entry(owner)
            .or_default()
            .entry(property.to_owned())
            .or_default()
            .entry(referenced)
            .or_insert(0);
        *count += 1;
        if *count > 1 {
            return false;
        }

        self.consumers.entry(referenced).or_default().push(Dependency {
            proxy: owner,
            property: property.to_owned(),
        });
        self.producers.entry(owner).or_default().push(Dependency {
            proxy: referenced,
            property: property.to_owned(),
        });
        true
    }

    /// Releases one reference from `owner.property` to `referenced`.
    ///
    /// Returns `true` if this was the last live reference, i.e. the edges
    /// were removed.
    ///
    /// # Panics
    ///
    /// Panics if no reference is recorded: counts never go negative.
    pub fn remove_reference(
        &mut self,
        owner: ProxyId,
        property: &str,
        referenced: ProxyId,
    ) -> bool {
        // Stored counts are always positive; a missing entry means zero.
        let Some(count) = self
            .counts
            .get_mut(&owner)
            .and_then(|props| props.get_mut(property))
            .and_then(|refs| refs.get_mut(&referenced))
        else {
            panic!("reference count underflow: {owner}.{property} does not reference {referenced}");
        };
        *count -= 1;
        if *count > 0 {
            return false;
        }

        if let Some(props) = self.counts.get_mut(&owner) {
            if let Some(refs) = props.get_mut(property) {
                refs.remove(&referenced);
                if refs.is_empty() {
                    props.remove(property);
                }
            }
            if props.is_empty() {
                self.counts.remove(&owner);
            }
        }

        detach(&mut self.consumers, referenced, owner, property);
        detach(&mut self.producers, owner, referenced, property);
        true
    }

    /// Returns how many live references `owner.property` holds to `referenced`.
    #[must_use]
    pub fn reference_count(&self, owner: ProxyId, property: &str, referenced: ProxyId) -> u32 {
        self.counts
            .get(&owner)
            .and_then(|props| props.get(property))
            .and_then(|refs| refs.get(&referenced))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the `(owner, property)` pairs consuming `id`.
    ///
    /// Edges are yielded in creation order.
    pub fn consumers(&self, id: ProxyId) -> impl Iterator<Item = &Dependency> + '_ {
        self.consumers.get(&id).into_iter().flatten()
    }

    /// Returns the `(referenced, property)` pairs feeding `id`.
    ///
    /// Edges are yielded in creation order.
    pub fn producers(&self, id: ProxyId) -> impl Iterator<Item = &Dependency> + '_ {
        self.producers.get(&id).into_iter().flatten()
    }

    /// Drops every reference held by `id`.
    ///
    /// References other proxies hold *to* `id` keep their counts and edges;
    /// they are released when the referencing property changes.
    pub fn remove_proxy(&mut self, id: ProxyId) {
        if let Some(props) = self.counts.remove(&id) {
            for (property, refs) in props {
                for referenced in refs.keys() {
                    detach(&mut self.consumers, *referenced, id, &property);
                }
            }
        }
        self.producers.remove(&id);
    }

    /// Removes every edge and count.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.consumers.clear();
        self.producers.clear();
    }
}

/// Removes the `(other, property)` edge from `node`'s list.
fn detach(map: &mut HashMap<ProxyId, Edges>, node: ProxyId, other: ProxyId, property: &str) {
    if let Some(edges) = map.get_mut(&node) {
        if let Some(pos) = edges
            .iter()
            .position(|d| d.proxy == other && d.property == property)
        {
            edges.remove(pos);
        }
        if edges.is_empty() {
            map.remove(&node);
        }
    }
}
