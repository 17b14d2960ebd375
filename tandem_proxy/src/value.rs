// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property value payloads.
//!
//! This module provides [`PropertyValue`], the closed set of payloads a
//! property can hold. Values are plain data: copying a property copies the
//! payload, never a reference to another property.

use smallvec::SmallVec;

use crate::id::ProxyId;

/// Inline storage for short numeric vectors (positions, sizes, colors).
pub type Components<T> = SmallVec<[T; 4]>;

/// The payload of a property.
///
/// # Example
///
/// ```rust
/// use tandem_proxy::PropertyValue;
///
/// let value = PropertyValue::doubles([1.0, 2.0, 3.0]);
/// assert_eq!(value.element(1), Some(2.0));
///
/// let edited = value.with_element(1, 5.0).unwrap();
/// assert_eq!(edited, PropertyValue::doubles([1.0, 5.0, 3.0]));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PropertyValue {
    /// No value.
    #[default]
    Empty,
    /// A boolean flag.
    Bool(bool),
    /// A single integer.
    Int(i64),
    /// A single floating-point number.
    Double(f64),
    /// A string.
    Text(String),
    /// A short integer vector.
    Ints(Components<i64>),
    /// A short floating-point vector.
    Doubles(Components<f64>),
    /// References to other proxies, in order; duplicates are allowed.
    Proxies(Vec<ProxyId>),
}

impl PropertyValue {
    /// Builds a [`PropertyValue::Ints`] from any integer sequence.
    pub fn ints(values: impl IntoIterator<Item = i64>) -> Self {
        Self::Ints(values.into_iter().collect())
    }

    /// Builds a [`PropertyValue::Doubles`] from any float sequence.
    pub fn doubles(values: impl IntoIterator<Item = f64>) -> Self {
        Self::Doubles(values.into_iter().collect())
    }

    /// Builds a [`PropertyValue::Text`].
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the boolean payload, if this is a [`PropertyValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a scalar view of the payload.
    ///
    /// Integers widen to `f64`; single-element vectors yield their element.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Doubles(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Returns the integer vector payload.
    #[must_use]
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Ints(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the float vector payload.
    #[must_use]
    pub fn as_doubles(&self) -> Option<&[f64]> {
        match self {
            Self::Doubles(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the referenced proxies, or an empty slice for other payloads.
    #[must_use]
    pub fn proxies(&self) -> &[ProxyId] {
        match self {
            Self::Proxies(ids) => ids,
            _ => &[],
        }
    }

    /// Reads one numeric element.
    ///
    /// Scalars answer for element 0 only.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<f64> {
        match self {
            Self::Doubles(v) => v.get(index).copied(),
            Self::Ints(v) => v.get(index).map(|i| *i as f64),
            Self::Double(_) | Self::Int(_) if index == 0 => self.as_f64(),
            _ => None,
        }
    }

    /// Returns a copy with one numeric element replaced.
    ///
    /// Vectors grow with zeros when `index` is past the end. Integer payloads
    /// are rounded. Returns `None` for non-numeric payloads.
    #[must_use]
    pub fn with_element(&self, index: usize, value: f64) -> Option<Self> {
        match self {
            Self::Double(_) if index == 0 => Some(Self::Double(value)),
            #[expect(clippy::cast_possible_truncation, reason = "rounded on purpose")]
            Self::Int(_) if index == 0 => Some(Self::Int(value.round() as i64)),
            Self::Doubles(v) => {
                let mut v = v.clone();
                if v.len() <= index {
                    v.resize(index + 1, 0.0);
                }
                v[index] = value;
                Some(Self::Doubles(v))
            }
            Self::Ints(v) => {
                let mut v = v.clone();
                if v.len() <= index {
                    v.resize(index + 1, 0);
                }
                #[expect(clippy::cast_possible_truncation, reason = "rounded on purpose")]
                let rounded = value.round() as i64;
                v[index] = rounded;
                Some(Self::Ints(v))
            }
            Self::Empty if index == 0 => Some(Self::Double(value)),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<Vec<ProxyId>> for PropertyValue {
    fn from(value: Vec<ProxyId>) -> Self {
        Self::Proxies(value)
    }
}
