// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

bitflags::bitflags! {
    /// Role of an endpoint in a link.
    ///
    /// INPUT endpoints are observed and drive propagation; OUTPUT endpoints
    /// receive it. An endpoint may carry both roles.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        /// Changes on this endpoint are propagated.
        const INPUT  = 0b0000_0001;
        /// This endpoint receives propagated changes.
        const OUTPUT = 0b0000_0010;
    }
}

impl Direction {
    /// Returns `true` if the mask includes [`Direction::INPUT`].
    #[must_use]
    #[inline]
    pub fn is_input(self) -> bool {
        self.contains(Self::INPUT)
    }

    /// Returns `true` if the mask includes [`Direction::OUTPUT`].
    #[must_use]
    #[inline]
    pub fn is_output(self) -> bool {
        self.contains(Self::OUTPUT)
    }

    /// Parses the persisted label of a single role.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "input" => Some(Self::INPUT),
            "output" => Some(Self::OUTPUT),
            _ => None,
        }
    }

    /// Returns the persisted labels of the roles in this mask, input first.
    pub fn labels(self) -> impl Iterator<Item = &'static str> {
        [(Self::INPUT, "input"), (Self::OUTPUT, "output")]
            .into_iter()
            .filter(move |(role, _)| self.contains(*role))
            .map(|(_, label)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_each_role() {
        assert_eq!(Direction::INPUT.labels().collect::<Vec<_>>(), ["input"]);
        assert_eq!(
            (Direction::INPUT | Direction::OUTPUT)
                .labels()
                .collect::<Vec<_>>(),
            ["input", "output"]
        );
        assert_eq!(Direction::empty().labels().count(), 0);
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(Direction::from_label("output"), Some(Direction::OUTPUT));
        assert_eq!(Direction::from_label("Output"), None);
        assert!(Direction::from_label("input").unwrap().is_input());
    }
}
