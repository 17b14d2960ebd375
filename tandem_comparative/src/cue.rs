// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation cues producing one value per grid cell.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tandem_proxy::{Proxy, WeakProxy};

/// How a cue assigns values to cells.
///
/// Ranges interpolate linearly; a range over a single cell yields `min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CueRule {
    /// One value at cell `(x, y)`; `None` matches every column or row.
    Single {
        /// Column, or every column.
        x: Option<u32>,
        /// Row, or every row.
        y: Option<u32>,
        /// The value.
        value: f64,
    },
    /// Interpolates across columns, in one row or in all of them.
    XRange {
        /// Row, or every row.
        row: Option<u32>,
        /// Value in the first column.
        min: f64,
        /// Value in the last column.
        max: f64,
    },
    /// Interpolates across rows, in one column or in all of them.
    YRange {
        /// Column, or every column.
        column: Option<u32>,
        /// Value in the first row.
        min: f64,
        /// Value in the last row.
        max: f64,
    },
    /// Interpolates across all cells in row-major order.
    TRange {
        /// Value in the first cell.
        min: f64,
        /// Value in the last cell.
        max: f64,
    },
    /// Interpolates across all cells in column-major order.
    TRangeVerticalFirst {
        /// Value in the first cell.
        min: f64,
        /// Value in the last cell.
        max: f64,
    },
}

impl CueRule {
    /// Returns the value this rule assigns to `(x, y)` of a `dx` by `dy` grid.
    #[must_use]
    pub fn value_at(&self, x: u32, y: u32, dx: u32, dy: u32) -> Option<f64> {
        match *self {
            Self::Single { x: cx, y: cy, value } => {
                (cx.is_none_or(|cx| cx == x) && cy.is_none_or(|cy| cy == y)).then_some(value)
            }
            Self::XRange { row, min, max } => row
                .is_none_or(|row| row == y)
                .then(|| lerp(min, max, x, dx)),
            Self::YRange { column, min, max } => column
                .is_none_or(|column| column == x)
                .then(|| lerp(min, max, y, dy)),
            Self::TRange { min, max } => Some(lerp(min, max, y * dx + x, dx * dy)),
            Self::TRangeVerticalFirst { min, max } => Some(lerp(min, max, x * dy + y, dx * dy)),
        }
    }
}

fn lerp(min: f64, max: f64, index: u32, count: u32) -> f64 {
    if count <= 1 {
        return min;
    }
    min + (max - min) * f64::from(index) / f64::from(count - 1)
}

/// The property a cue animates: one element of a property of a proxy.
#[derive(Clone, Debug)]
pub struct CueTarget {
    proxy: WeakProxy,
    property: String,
    element: usize,
}

impl CueTarget {
    /// Returns the animated proxy, if it is still alive.
    #[must_use]
    pub fn proxy(&self) -> Option<Proxy> {
        self.proxy.upgrade()
    }

    /// Returns the animated property name.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Returns the animated element of the property.
    #[must_use]
    pub fn element(&self) -> usize {
        self.element
    }
}

/// An animation cue for a comparative grid.
///
/// A cue without a target drives the time shown by each cell. Every mutation
/// bumps [`revision`](Self::revision), which is how a grid notices that a cue
/// changed after its last update.
///
/// ```rust
/// use tandem_comparative::{ComparativeCue, CueRule};
///
/// let cue = ComparativeCue::new();
/// cue.add_rule(CueRule::TRange { min: 0.0, max: 3.0 });
/// assert_eq!(cue.value_at(1, 1, 2, 2), Some(3.0));
///
/// // Later rules win.
/// cue.add_rule(CueRule::Single { x: Some(1), y: Some(1), value: 10.0 });
/// assert_eq!(cue.value_at(1, 1, 2, 2), Some(10.0));
/// assert_eq!(cue.value_at(0, 1, 2, 2), Some(2.0));
/// ```
#[derive(Debug)]
pub struct ComparativeCue {
    target: RefCell<Option<CueTarget>>,
    rules: RefCell<Vec<CueRule>>,
    enabled: Cell<bool>,
    revision: Cell<u64>,
}

impl ComparativeCue {
    /// Creates an enabled time cue with no rules.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            target: RefCell::new(None),
            rules: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            revision: Cell::new(0),
        })
    }

    /// Animates element `element` of `proxy.property`.
    pub fn set_target(&self, proxy: &Proxy, property: &str, element: usize) {
        *self.target.borrow_mut() = Some(CueTarget {
            proxy: proxy.downgrade(),
            property: property.to_owned(),
            element,
        });
        self.bump();
    }

    /// Turns the cue back into a time cue.
    pub fn clear_target(&self) {
        if self.target.borrow_mut().take().is_some() {
            self.bump();
        }
    }

    /// Returns the animated target, or `None` for a time cue.
    #[must_use]
    pub fn target(&self) -> Option<CueTarget> {
        self.target.borrow().clone()
    }

    /// Returns `true` if the cue has no animated target.
    #[must_use]
    pub fn is_time_cue(&self) -> bool {
        self.target.borrow().is_none()
    }

    /// Enables or disables the cue.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) != enabled {
            self.bump();
        }
    }

    /// Returns `true` if the cue takes part in updates.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Appends a rule.
    pub fn add_rule(&self, rule: CueRule) {
        self.rules.borrow_mut().push(rule);
        self.bump();
    }

    /// Removes every rule.
    pub fn clear_rules(&self) {
        self.rules.borrow_mut().clear();
        self.bump();
    }

    /// Returns a copy of the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> Vec<CueRule> {
        self.rules.borrow().clone()
    }

    /// Returns the value of cell `(x, y)` in a `dx` by `dy` grid.
    ///
    /// The last rule covering the cell wins; `None` if no rule does.
    #[must_use]
    pub fn value_at(&self, x: u32, y: u32, dx: u32, dy: u32) -> Option<f64> {
        self.rules
            .borrow()
            .iter()
            .rev()
            .find_map(|rule| rule.value_at(x, y, dx, dy))
    }

    /// Returns a counter bumped by every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    fn bump(&self) {
        self.revision.set(self.revision.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_and_wildcards() {
        let cell = CueRule::Single {
            x: Some(1),
            y: Some(0),
            value: 5.0,
        };
        assert_eq!(cell.value_at(1, 0, 3, 3), Some(5.0));
        assert_eq!(cell.value_at(1, 1, 3, 3), None);

        let column = CueRule::Single {
            x: Some(2),
            y: None,
            value: 1.0,
        };
        assert_eq!(column.value_at(2, 2, 3, 3), Some(1.0));
        assert_eq!(column.value_at(0, 2, 3, 3), None);
    }

    #[test]
    fn x_range_interpolates_columns() {
        let rule = CueRule::XRange {
            row: None,
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(rule.value_at(0, 1, 3, 2), Some(0.0));
        assert_eq!(rule.value_at(1, 1, 3, 2), Some(5.0));
        assert_eq!(rule.value_at(2, 0, 3, 2), Some(10.0));

        let one_row = CueRule::XRange {
            row: Some(1),
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(one_row.value_at(2, 0, 3, 2), None);
    }

    #[test]
    fn y_range_interpolates_rows() {
        let rule = CueRule::YRange {
            column: Some(0),
            min: 1.0,
            max: 2.0,
        };
        assert_eq!(rule.value_at(0, 0, 2, 3), Some(1.0));
        assert_eq!(rule.value_at(0, 1, 2, 3), Some(1.5));
        assert_eq!(rule.value_at(1, 1, 2, 3), None);
    }

    #[test]
    fn t_ranges_sweep_in_opposite_orders() {
        let rows = CueRule::TRange { min: 0.0, max: 3.0 };
        let columns = CueRule::TRangeVerticalFirst { min: 0.0, max: 3.0 };
        // Cell (1, 0) of a 2x2 grid is second row-major, third column-major.
        assert_eq!(rows.value_at(1, 0, 2, 2), Some(1.0));
        assert_eq!(columns.value_at(1, 0, 2, 2), Some(2.0));
    }

    #[test]
    fn one_cell_ranges_yield_min() {
        let rule = CueRule::TRange { min: 4.0, max: 8.0 };
        assert_eq!(rule.value_at(0, 0, 1, 1), Some(4.0));
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let cue = ComparativeCue::new();
        let start = cue.revision();
        cue.add_rule(CueRule::TRange { min: 0.0, max: 1.0 });
        cue.set_enabled(false);
        cue.set_enabled(false);
        cue.clear_rules();
        assert_eq!(cue.revision(), start + 3);
        assert!(cue.is_time_cue());
    }
}
